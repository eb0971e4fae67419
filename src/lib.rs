//! Server-side rendering and dispatch engine.
//!
//! Components produce element trees, which are converted to virtual nodes
//! and serialized to escaped HTML. Requests reach components through a route
//! table and an ordered middleware chain; the rendered page gets a client
//! bootstrap block spliced in before `</body>`.

pub mod component;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod html;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use component::{Component, Template};
pub use config::AppConfig;
pub use dispatch::{App, AppBuilder, Reply};
pub use error::{DispatchError, HttpError, MarkupError, RenderError, RouteError};
pub use http::{HttpServer, RequestContext, Response};
pub use lifecycle::Shutdown;
