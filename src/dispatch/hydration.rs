//! Client bootstrap generation and injection.
//!
//! # Data Flow
//! ```text
//! render (components push scripts, handlers provide state)
//!     → ScriptBag + state map on RequestContext
//!     → ScriptGenerator::bootstrap → block
//!     → HydrationInjector::inject(markup, block)
//!         → spliced before the first literal `</body>`, or appended
//! ```
//!
//! # Design Decisions
//! - Script content is forwarded verbatim; only the JSON state is escaped
//!   (`</` and `<!--`) so it cannot close or comment out its `<script>` element
//! - Injection runs per request, after the render cache, so one request's
//!   state never ends up in another request's page
//! - An empty block leaves the markup untouched

use serde_json::{Map, Value};

use crate::config::HydrationConfig;
use crate::error::DispatchError;
use crate::html::escape::{escape, escape_script_json};
use crate::http::RequestContext;

/// Splice point for the bootstrap block.
pub const BODY_CLOSE: &str = "</body>";

/// Scripts collected from components during one render.
#[derive(Debug, Default, Clone)]
pub struct ScriptBag {
    mount: Vec<String>,
    unmount: Vec<String>,
    inline: Vec<String>,
}

impl ScriptBag {
    pub fn push_mount(&mut self, script: impl Into<String>) {
        self.mount.push(script.into());
    }

    pub fn push_unmount(&mut self, script: impl Into<String>) {
        self.unmount.push(script.into());
    }

    pub fn push_inline(&mut self, script: impl Into<String>) {
        self.inline.push(script.into());
    }

    pub fn mount(&self) -> &[String] {
        &self.mount
    }

    pub fn unmount(&self) -> &[String] {
        &self.unmount
    }

    pub fn inline(&self) -> &[String] {
        &self.inline
    }

    pub fn is_empty(&self) -> bool {
        self.mount.is_empty() && self.unmount.is_empty() && self.inline.is_empty()
    }

    /// Current fill level, for [`ScriptBag::since`].
    pub fn mark(&self) -> ScriptMark {
        ScriptMark {
            mount: self.mount.len(),
            unmount: self.unmount.len(),
            inline: self.inline.len(),
        }
    }

    /// Scripts pushed after `mark` was taken.
    pub fn since(&self, mark: ScriptMark) -> ScriptBag {
        let tail = |v: &[String], from: usize| v.get(from..).unwrap_or_default().to_vec();
        ScriptBag {
            mount: tail(&self.mount, mark.mount),
            unmount: tail(&self.unmount, mark.unmount),
            inline: tail(&self.inline, mark.inline),
        }
    }

    /// Append every script of `other`, keeping its order.
    pub fn append(&mut self, other: &ScriptBag) {
        self.mount.extend_from_slice(&other.mount);
        self.unmount.extend_from_slice(&other.unmount);
        self.inline.extend_from_slice(&other.inline);
    }
}

/// Per-kind lengths of a [`ScriptBag`] at some point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptMark {
    mount: usize,
    unmount: usize,
    inline: usize,
}

/// Turns hydration state and collected scripts into a markup block.
pub trait ScriptGenerator: Send + Sync {
    fn bootstrap(&self, state: &Map<String, Value>, scripts: &ScriptBag) -> Result<String, DispatchError>;
}

/// Default generator: a JSON state element followed by plain `<script>` tags.
///
/// ```text
/// <script type="application/json" id="ssr-state">{"user":{"id":42}}</script>
/// <script>inline…</script>
/// <script>mount…</script>
/// <script>addEventListener("pagehide",function(){unmount…});</script>
/// ```
#[derive(Debug, Clone)]
pub struct JsonBootstrap {
    state_element_id: String,
}

impl JsonBootstrap {
    pub fn new(state_element_id: impl Into<String>) -> Self {
        Self {
            state_element_id: state_element_id.into(),
        }
    }
}

impl Default for JsonBootstrap {
    fn default() -> Self {
        Self::new(HydrationConfig::default().state_element_id)
    }
}

impl ScriptGenerator for JsonBootstrap {
    fn bootstrap(&self, state: &Map<String, Value>, scripts: &ScriptBag) -> Result<String, DispatchError> {
        let mut out = String::new();

        if !state.is_empty() {
            let json = serde_json::to_string(state)?;
            out.push_str(r#"<script type="application/json" id=""#);
            out.push_str(&escape(&self.state_element_id));
            out.push_str(r#"">"#);
            out.push_str(&escape_script_json(&json));
            out.push_str("</script>");
        }

        for script in scripts.inline().iter().chain(scripts.mount()) {
            out.push_str("<script>");
            out.push_str(script);
            out.push_str("</script>");
        }

        if !scripts.unmount().is_empty() {
            out.push_str(r#"<script>addEventListener("pagehide",function(){"#);
            for script in scripts.unmount() {
                out.push_str(script);
                if !script.trim_end().ends_with(';') {
                    out.push(';');
                }
            }
            out.push_str("});</script>");
        }

        Ok(out)
    }
}

/// Builds the bootstrap block for a request and splices it into markup.
pub struct HydrationInjector {
    enabled: bool,
    generator: Box<dyn ScriptGenerator>,
}

impl HydrationInjector {
    pub fn new(enabled: bool, generator: Box<dyn ScriptGenerator>) -> Self {
        Self { enabled, generator }
    }

    pub fn from_config(config: &HydrationConfig) -> Self {
        Self::new(
            config.enabled,
            Box::new(JsonBootstrap::new(config.state_element_id.clone())),
        )
    }

    pub fn with_generator(mut self, generator: Box<dyn ScriptGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Generate the block for `ctx` and splice it into `markup`.
    pub fn apply(&self, markup: String, ctx: &RequestContext) -> Result<String, DispatchError> {
        if !self.enabled {
            return Ok(markup);
        }
        let block = self.generator.bootstrap(ctx.state(), ctx.scripts())?;
        if block.is_empty() {
            return Ok(markup);
        }
        tracing::trace!(bytes = block.len(), "Injecting bootstrap block");
        Ok(Self::inject(&markup, &block))
    }

    /// Insert `block` before the first `</body>`, or append it.
    pub fn inject(markup: &str, block: &str) -> String {
        let mut out = String::with_capacity(markup.len() + block.len());
        match markup.find(BODY_CLOSE) {
            Some(at) => {
                out.push_str(&markup[..at]);
                out.push_str(block);
                out.push_str(&markup[at..]);
            }
            None => {
                out.push_str(markup);
                out.push_str(block);
            }
        }
        out
    }
}

impl Default for HydrationInjector {
    fn default() -> Self {
        Self::from_config(&HydrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inject_before_body_close() {
        assert_eq!(
            HydrationInjector::inject("<body><h1>Hi</h1></body>", "X"),
            "<body><h1>Hi</h1>X</body>"
        );
    }

    #[test]
    fn test_inject_first_body_close_only() {
        assert_eq!(
            HydrationInjector::inject("<body>a</body></body>", "X"),
            "<body>aX</body></body>"
        );
    }

    #[test]
    fn test_inject_appends_without_body() {
        assert_eq!(HydrationInjector::inject("<p>x</p>", "X"), "<p>x</p>X");
        assert_eq!(HydrationInjector::inject("", "X"), "X");
    }

    #[test]
    fn test_json_bootstrap_escapes_state() {
        let mut state = Map::new();
        state.insert("html".into(), json!("</script><b>"));
        let block = JsonBootstrap::default()
            .bootstrap(&state, &ScriptBag::default())
            .unwrap();
        assert_eq!(
            block,
            r#"<script type="application/json" id="ssr-state">{"html":"<\/script><b>"}</script>"#
        );
    }

    #[test]
    fn test_json_bootstrap_scripts() {
        let mut scripts = ScriptBag::default();
        scripts.push_inline("a()");
        scripts.push_mount("b()");
        scripts.push_unmount("c()");
        let block = JsonBootstrap::default().bootstrap(&Map::new(), &scripts).unwrap();
        assert_eq!(
            block,
            r#"<script>a()</script><script>b()</script><script>addEventListener("pagehide",function(){c();});</script>"#
        );
    }

    #[test]
    fn test_script_bag_since_mark() {
        let mut bag = ScriptBag::default();
        bag.push_mount("early()");
        let mark = bag.mark();
        bag.push_mount("late()");
        bag.push_unmount("bye()");

        let added = bag.since(mark);
        assert_eq!(added.mount(), ["late()".to_string()]);
        assert_eq!(added.unmount(), ["bye()".to_string()]);
        assert!(added.inline().is_empty());

        let mut other = ScriptBag::default();
        other.push_mount("mine()");
        other.append(&added);
        assert_eq!(other.mount(), ["mine()".to_string(), "late()".to_string()]);
    }

    #[test]
    fn test_empty_bootstrap_leaves_markup() {
        let injector = HydrationInjector::default();
        let ctx = RequestContext::get("/");
        let markup = "<body></body>".to_string();
        assert_eq!(injector.apply(markup.clone(), &ctx).unwrap(), markup);
    }

    #[test]
    fn test_disabled_injector() {
        let injector = HydrationInjector::new(false, Box::new(JsonBootstrap::default()));
        let mut ctx = RequestContext::get("/");
        ctx.provide_state("a", 1);
        assert_eq!(
            injector.apply("<body></body>".into(), &ctx).unwrap(),
            "<body></body>"
        );
    }
}
