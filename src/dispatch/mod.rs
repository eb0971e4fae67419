//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → app.rs: RouteTable lookup (HEAD falls back to GET)
//!         → no route: 404, chain never built
//!     → MiddlewareStack::run(ctx, endpoint)
//!         endpoint:
//!             handler(ctx) → Reply
//!             Reply::Page → cache.rs lookup
//!                 hit  → stored markup
//!                 miss → lifecycle → VNode → document shell → serialize
//!                        → hydration.rs inject → cache.rs store
//!     → error boundary (if the chain failed)
//!     → finalize (content-type, location, HEAD body drop)
//! ```
//!
//! # Design Decisions
//! - `App` is frozen by `AppBuilder::build`; dispatch takes `&self`
//! - Rendering happens inside the chain, so middleware wrapping the
//!   response sees the final markup
//! - The core is synchronous; the HTTP bridge moves it onto blocking threads

pub mod app;
pub mod builder;
pub mod cache;
pub mod hydration;
pub mod reply;

pub use app::{App, ErrorBoundary, Handler};
pub use builder::AppBuilder;
pub use cache::{CacheKey, RenderCache};
pub use hydration::{HydrationInjector, JsonBootstrap, ScriptBag, ScriptGenerator};
pub use reply::Reply;
