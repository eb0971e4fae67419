//! VNode → markup.
//!
//! A single exhaustive match over [`VNode`]. `Text` and attribute values go
//! through [`escape`](super::escape::escape); `Raw` is the only unescaped path.

use crate::html::escape::escape_into;
use crate::html::vnode::{VElement, VNode};

/// Serialize a tree into a new string.
pub fn render_to_string(node: &VNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

/// Serialize a tree, appending to `out`.
pub fn write_node(node: &VNode, out: &mut String) {
    match node {
        VNode::Element(el) => write_element(el, out),
        VNode::Text(text) => escape_into(text, out),
        VNode::Raw(markup) => out.push_str(markup),
        VNode::Fragment(children) => {
            for child in children {
                write_node(child, out);
            }
        }
    }
}

fn write_element(el: &VElement, out: &mut String) {
    out.push('<');
    out.push_str(el.tag());
    for (name, value) in el.attrs().iter() {
        out.push(' ');
        out.push_str(name);
        if let Some(value) = value {
            out.push_str("=\"");
            escape_into(value, out);
            out.push('"');
        }
    }
    out.push('>');

    if el.is_void() {
        return;
    }

    for child in el.children() {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(el.tag());
    out.push('>');
}
