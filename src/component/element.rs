//! User-facing element tree.
//!
//! Unlike [`VNode`](crate::html::VNode), a [`Node`] may hold components that
//! have not rendered yet and elements that have not been validated. Both are
//! resolved by [`convert`](super::convert).

use std::fmt;

use crate::component::lifecycle::Component;
use crate::html::Attributes;

/// A node of the element tree returned by `Component::render`.
pub enum Node {
    Element(Element),
    /// Escaped on output.
    Text(String),
    /// Emitted verbatim; caller-trusted.
    Raw(String),
    Fragment(Vec<Node>),
    /// Rendered (with its full lifecycle) during conversion.
    Component(Box<dyn Component>),
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(el) => f.debug_tuple("Element").field(el).finish(),
            Node::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Node::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Node::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Node::Component(c) => f.debug_tuple("Component").field(&c.name()).finish(),
        }
    }
}

/// An element under construction.
#[derive(Debug)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: Attributes,
    pub(crate) children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(name, value);
        self
    }

    /// Boolean attribute, rendered as a bare name.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.set_flag(name);
        self
    }

    pub fn child(mut self, child: impl IntoNode) -> Self {
        self.children.push(child.into_node());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoNode,
    {
        self.children
            .extend(children.into_iter().map(IntoNode::into_node));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }
}

/// Conversion into an element-tree node.
pub trait IntoNode {
    fn into_node(self) -> Node;
}

impl IntoNode for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoNode for Element {
    fn into_node(self) -> Node {
        Node::Element(self)
    }
}

impl IntoNode for String {
    fn into_node(self) -> Node {
        Node::Text(self)
    }
}

impl IntoNode for &str {
    fn into_node(self) -> Node {
        Node::Text(self.to_string())
    }
}

impl<T: IntoNode> IntoNode for Option<T> {
    fn into_node(self) -> Node {
        match self {
            Some(n) => n.into_node(),
            None => Node::Fragment(Vec::new()),
        }
    }
}

impl<T: IntoNode> IntoNode for Vec<T> {
    fn into_node(self) -> Node {
        Node::Fragment(self.into_iter().map(IntoNode::into_node).collect())
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// Start an element.
pub fn el(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

/// Escaped text.
pub fn text(s: impl Into<String>) -> Node {
    Node::Text(s.into())
}

/// Trusted markup, emitted unescaped.
pub fn raw(s: impl Into<String>) -> Node {
    Node::Raw(s.into())
}

pub fn fragment<I>(children: I) -> Node
where
    I: IntoIterator,
    I::Item: IntoNode,
{
    Node::Fragment(children.into_iter().map(IntoNode::into_node).collect())
}

/// Embed a child component.
pub fn component(c: impl Component + 'static) -> Node {
    Node::Component(Box::new(c))
}
