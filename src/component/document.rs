//! HTML document shell.
//!
//! Wraps a rendered page body in `<!DOCTYPE html><html><head>…</head><body>…`
//! using the page component's head hooks. The shell is built from virtual
//! nodes, so title and description go through the normal escaping path.

use crate::config::RenderConfig;
use crate::error::MarkupError;
use crate::html::{Attributes, VElement, VNode};

/// Head content gathered from a page component.
#[derive(Debug, Default)]
pub struct Head {
    pub title: Option<String>,
    pub description: Option<String>,
    pub extra: Vec<VNode>,
}

/// True when `node` already is a full document (an `<html>` root).
pub fn is_document(node: &VNode) -> bool {
    match node {
        VNode::Element(el) => el.tag().eq_ignore_ascii_case("html"),
        VNode::Fragment(children) => children.iter().any(is_document),
        _ => false,
    }
}

/// Wrap `body` in a document using `head` and the render settings.
pub fn wrap_document(body: VNode, head: Head, config: &RenderConfig) -> Result<VNode, MarkupError> {
    let mut head_children = Vec::new();

    if config.charset_meta {
        let mut attrs = Attributes::new();
        attrs.set("charset", "utf-8");
        head_children.push(VElement::new("meta", attrs, Vec::new())?.into());
    }
    if let Some(title) = head.title {
        head_children.push(VNode::element("title", [VNode::Text(title)])?);
    }
    if let Some(description) = head.description {
        let mut attrs = Attributes::new();
        attrs.set("name", "description");
        attrs.set("content", description);
        head_children.push(VElement::new("meta", attrs, Vec::new())?.into());
    }
    head_children.extend(head.extra);

    let mut html_attrs = Attributes::new();
    if !config.lang.is_empty() {
        html_attrs.set("lang", config.lang.as_str());
    }

    let html = VElement::new(
        "html",
        html_attrs,
        vec![
            VNode::element("head", head_children)?,
            VNode::element("body", [body])?,
        ],
    )?;

    Ok(VNode::Fragment(vec![
        VNode::Raw("<!DOCTYPE html>".to_string()),
        html.into(),
    ]))
}
