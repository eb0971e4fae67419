//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging → Build App → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     trigger() or Ctrl+C → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routes, then listener
//! - Background tasks (cache purge) subscribe to the same signal

pub mod shutdown;

pub use shutdown::Shutdown;
