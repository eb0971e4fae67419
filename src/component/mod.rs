//! Component subsystem.
//!
//! # Data Flow
//! ```text
//! handler → Box<dyn Component>
//!     → lifecycle.rs (pre_render → render → post_render)
//!     → element.rs tree (Node; may embed child components)
//!     → convert.rs (recursively render components, validate, build VNodes)
//!     → document.rs (optional <html> shell from head hooks)
//!     → html::serializer
//! ```
//!
//! # Design Decisions
//! - One required method, every hook defaulted on the trait
//! - `Template` offers the same contract as a record of optional closures
//! - Components live for one request; nothing is retained between renders

pub mod convert;
pub mod document;
pub mod element;
pub mod lifecycle;

pub use convert::{render_component, to_vnode};
pub use document::{wrap_document, Head};
pub use element::{component, el, fragment, raw, text, Element, IntoNode, Node};
pub use lifecycle::{Component, Template};
