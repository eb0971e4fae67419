//! Markup subsystem.
//!
//! # Data Flow
//! ```text
//! component::Node (element tree, may hold components)
//!     → component::convert (render components, validate tags)
//!     → VNode tree (Element | Text | Raw | Fragment)
//!     → serializer.rs (pure, deterministic)
//!     → markup String
//! ```
//!
//! # Design Decisions
//! - Closed enum: the serializer is one exhaustive match
//! - Text is always escaped; Raw is the only way markup reaches output verbatim
//! - Void-element and tag-name invariants are checked at construction,
//!   so serialization cannot fail

pub mod attributes;
pub mod escape;
pub mod serializer;
pub mod vnode;

pub use attributes::Attributes;
pub use serializer::{render_to_string, write_node};
pub use vnode::{VElement, VNode};
