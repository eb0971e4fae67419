//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing and timeout layers)
//!     → request.rs (RequestContext: method, path, query, headers, body)
//!     → dispatch::App::dispatch on the blocking pool
//!     → response.rs (Response envelope, finalized)
//!     → server.rs writes status, headers and body to the client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use response::{Body, Response};
pub use server::HttpServer;
