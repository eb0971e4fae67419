//! Virtual node tree.

use crate::error::MarkupError;
use crate::html::attributes::Attributes;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Returns true for tags in [`VOID_ELEMENTS`] (ASCII case-insensitive).
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// A tag name is an ASCII letter followed by letters, digits or `-`.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// An attribute name is non-empty and free of whitespace, control
/// characters and `" ' < > / =`.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}

/// One node of the per-request markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    Element(VElement),
    /// Escaped on output.
    Text(String),
    /// Emitted verbatim.
    Raw(String),
    /// Children spliced into the parent with no wrapper.
    Fragment(Vec<VNode>),
}

impl VNode {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Self::Raw(s.into())
    }

    pub fn fragment(children: impl IntoIterator<Item = VNode>) -> Self {
        Self::Fragment(children.into_iter().collect())
    }

    /// Convenience for an element without attributes.
    pub fn element(
        tag: impl Into<String>,
        children: impl IntoIterator<Item = VNode>,
    ) -> Result<Self, MarkupError> {
        VElement::new(tag, Attributes::new(), children.into_iter().collect()).map(Self::Element)
    }

    /// Tag name if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element(el) => Some(el.tag()),
            _ => None,
        }
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        VNode::Element(el)
    }
}

/// A validated element node.
///
/// Fields are private so the tag, attribute-name and void-element invariants can only be
/// established through [`VElement::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElement {
    tag: String,
    attrs: Attributes,
    children: Vec<VNode>,
}

impl VElement {
    pub fn new(
        tag: impl Into<String>,
        attrs: Attributes,
        children: Vec<VNode>,
    ) -> Result<Self, MarkupError> {
        let tag = tag.into();
        if !is_valid_tag(&tag) {
            return Err(MarkupError::InvalidTag(tag));
        }
        if let Some((name, _)) = attrs.iter().find(|(name, _)| !is_valid_attribute_name(name)) {
            return Err(MarkupError::InvalidAttribute(name.to_string()));
        }
        if is_void(&tag) && !children.is_empty() {
            return Err(MarkupError::VoidChildren(tag));
        }
        Ok(Self {
            tag,
            attrs,
            children,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.tag)
    }
}
