//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (method, path, route,
//!       request_id, status, elapsed_ms)
//!     → logging.rs subscriber (pretty or JSON, to stdout)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the context into every dispatch log line

pub mod logging;

pub use logging::init_logging;
