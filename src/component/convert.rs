//! Element tree → virtual node tree.
//!
//! # Responsibilities
//! - Run the lifecycle of every component met in the tree
//! - Validate element tags and void-element children
//! - Collect mount/unmount/inline scripts into the request's script bag
//!
//! # Design Decisions
//! - Recursion follows the tree; no depth limit, component cycles are a
//!   caller error
//! - Malformed elements fail the render instead of emitting corrupt markup

use crate::component::element::Node;
use crate::component::lifecycle::Component;
use crate::error::RenderError;
use crate::html::{VElement, VNode};
use crate::http::RequestContext;

/// Convert one element-tree node, rendering nested components.
pub fn to_vnode(node: Node, ctx: &mut RequestContext) -> Result<VNode, RenderError> {
    match node {
        Node::Text(s) => Ok(VNode::Text(s)),
        Node::Raw(s) => Ok(VNode::Raw(s)),
        Node::Fragment(children) => Ok(VNode::Fragment(convert_children(children, ctx)?)),
        Node::Element(el) => {
            let children = convert_children(el.children, ctx)?;
            Ok(VElement::new(el.tag, el.attrs, children)?.into())
        }
        Node::Component(mut c) => render_component(c.as_mut(), ctx),
    }
}

fn convert_children(children: Vec<Node>, ctx: &mut RequestContext) -> Result<Vec<VNode>, RenderError> {
    children.into_iter().map(|c| to_vnode(c, ctx)).collect()
}

/// Run `pre_render → render → post_render` and return the converted tree.
pub fn render_component(
    component: &mut dyn Component,
    ctx: &mut RequestContext,
) -> Result<VNode, RenderError> {
    tracing::trace!(component = %component.name(), "Rendering component");

    component.pre_render(ctx)?;
    let tree = component.render()?;
    let vnode = to_vnode(tree, ctx)?;

    let scripts = ctx.scripts_mut();
    if let Some(script) = component.mount_script() {
        scripts.push_mount(script);
    }
    if let Some(script) = component.unmount_script() {
        scripts.push_unmount(script);
    }
    for script in component.inline_scripts() {
        scripts.push_inline(script);
    }

    component.post_render(ctx)?;
    Ok(vnode)
}
