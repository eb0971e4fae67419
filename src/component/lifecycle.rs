//! Component trait and the closure-based `Template`.
//!
//! # Lifecycle
//! ```text
//! pre_render(ctx) → render() → [convert tree, nested components] → post_render(ctx)
//! ```
//! If `pre_render` or `render` fails, `post_render` is not called.

use std::time::Duration;

use crate::component::element::Node;
use crate::error::RenderError;
use crate::http::RequestContext;

/// A unit that produces an element tree.
///
/// Only [`render`](Component::render) is required; every hook has a default:
/// no-op side effects, no scripts, no head content, `cacheable = true`,
/// `cache_duration = 0`.
pub trait Component {
    /// Produce the element tree from captured state.
    fn render(&self) -> Result<Node, RenderError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Side effects before rendering, e.g. loading data from the request.
    fn pre_render(&mut self, _ctx: &mut RequestContext) -> Result<(), RenderError> {
        Ok(())
    }

    /// Cleanup after a successful render.
    fn post_render(&mut self, _ctx: &mut RequestContext) -> Result<(), RenderError> {
        Ok(())
    }

    /// Client code run when the component mounts. Forwarded verbatim.
    fn mount_script(&self) -> Option<String> {
        None
    }

    /// Client code run when the component unmounts. Forwarded verbatim.
    fn unmount_script(&self) -> Option<String> {
        None
    }

    fn title(&self) -> Option<String> {
        None
    }

    fn meta_description(&self) -> Option<String> {
        None
    }

    /// Extra `<head>` content.
    fn head(&self) -> Option<Node> {
        None
    }

    fn inline_scripts(&self) -> Vec<String> {
        Vec::new()
    }

    fn cacheable(&self) -> bool {
        true
    }

    fn cache_duration(&self) -> Duration {
        Duration::ZERO
    }
}

type RenderFn<S> = Box<dyn Fn(&S) -> Result<Node, RenderError>>;
type HookFn<S> = Box<dyn FnMut(&mut S, &mut RequestContext) -> Result<(), RenderError>>;
type TextFn<S> = Box<dyn Fn(&S) -> String>;
type HeadFn<S> = Box<dyn Fn(&S) -> Node>;

/// A component assembled from optional closures over some state `S`.
///
/// ```ignore
/// let page = Template::new("user", None::<User>, |user| {
///     Ok(el("h1").child(user.as_ref().map(|u| u.name.clone())).into())
/// })
/// .on_pre_render(|user, ctx| {
///     *user = load_user(ctx.param("id"));
///     Ok(())
/// })
/// .with_title("User");
/// ```
pub struct Template<S = ()> {
    name: String,
    state: S,
    render: RenderFn<S>,
    pre_render: Option<HookFn<S>>,
    post_render: Option<HookFn<S>>,
    mount_script: Option<String>,
    unmount_script: Option<String>,
    title: Option<TextFn<S>>,
    meta_description: Option<TextFn<S>>,
    head: Option<HeadFn<S>>,
    inline_scripts: Vec<String>,
    cacheable: bool,
    cache_duration: Duration,
}

impl<S: 'static> Template<S> {
    pub fn new(
        name: impl Into<String>,
        state: S,
        render: impl Fn(&S) -> Result<Node, RenderError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            render: Box::new(render),
            pre_render: None,
            post_render: None,
            mount_script: None,
            unmount_script: None,
            title: None,
            meta_description: None,
            head: None,
            inline_scripts: Vec::new(),
            cacheable: true,
            cache_duration: Duration::ZERO,
        }
    }

    pub fn on_pre_render(
        mut self,
        f: impl FnMut(&mut S, &mut RequestContext) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.pre_render = Some(Box::new(f));
        self
    }

    pub fn on_post_render(
        mut self,
        f: impl FnMut(&mut S, &mut RequestContext) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.post_render = Some(Box::new(f));
        self
    }

    pub fn with_mount_script(mut self, script: impl Into<String>) -> Self {
        self.mount_script = Some(script.into());
        self
    }

    pub fn with_unmount_script(mut self, script: impl Into<String>) -> Self {
        self.unmount_script = Some(script.into());
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.with_title_fn(move |_| title.clone())
    }

    /// Title computed from state (after `pre_render`).
    pub fn with_title_fn(mut self, f: impl Fn(&S) -> String + 'static) -> Self {
        self.title = Some(Box::new(f));
        self
    }

    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.meta_description = Some(Box::new(move |_| description.clone()));
        self
    }

    pub fn with_head(mut self, f: impl Fn(&S) -> Node + 'static) -> Self {
        self.head = Some(Box::new(f));
        self
    }

    pub fn with_inline_script(mut self, script: impl Into<String>) -> Self {
        self.inline_scripts.push(script.into());
        self
    }

    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    pub fn cache_for(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: 'static> Component for Template<S> {
    fn render(&self) -> Result<Node, RenderError> {
        (self.render)(&self.state)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pre_render(&mut self, ctx: &mut RequestContext) -> Result<(), RenderError> {
        match self.pre_render.as_mut() {
            Some(f) => f(&mut self.state, ctx),
            None => Ok(()),
        }
    }

    fn post_render(&mut self, ctx: &mut RequestContext) -> Result<(), RenderError> {
        match self.post_render.as_mut() {
            Some(f) => f(&mut self.state, ctx),
            None => Ok(()),
        }
    }

    fn mount_script(&self) -> Option<String> {
        self.mount_script.clone()
    }

    fn unmount_script(&self) -> Option<String> {
        self.unmount_script.clone()
    }

    fn title(&self) -> Option<String> {
        self.title.as_ref().map(|f| f(&self.state))
    }

    fn meta_description(&self) -> Option<String> {
        self.meta_description.as_ref().map(|f| f(&self.state))
    }

    fn head(&self) -> Option<Node> {
        self.head.as_ref().map(|f| f(&self.state))
    }

    fn inline_scripts(&self) -> Vec<String> {
        self.inline_scripts.clone()
    }

    fn cacheable(&self) -> bool {
        self.cacheable
    }

    fn cache_duration(&self) -> Duration {
        self.cache_duration
    }
}
