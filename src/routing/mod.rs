//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming (method, path)
//!     → matcher.rs (normalize, split into segments)
//!     → router.rs (exact index, then parameterized scan)
//!     → Return: RouteMatch { route, params } or None
//!
//! Route Registration (at startup):
//!     register(method, "/users/:id", handler)
//!     → matcher.rs parses the pattern
//!     → no parameters: exact index, else per-method ordered list
//!     → conflicts rejected, table frozen inside the App
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: exact beats parameterized, then registration order

pub mod matcher;
pub mod router;

pub use matcher::{PathParams, PathPattern};
pub use router::{Route, RouteMatch, RouteTable};
