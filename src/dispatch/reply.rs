//! Handler results.

use serde::Serialize;
use serde_json::Value;

use crate::component::Component;
use crate::error::{DispatchError, HttpError};

/// What a handler answers with.
///
/// `Page` goes through the render pipeline (lifecycle, document shell,
/// serialization, hydration). The other variants become a response as-is.
pub enum Reply {
    Page(Box<dyn Component>),
    Html(String),
    Text(String),
    Json(Value),
    /// `303 See Other` to the target.
    Redirect(String),
    /// Deliberate status-coded error reply.
    Error(HttpError),
}

impl Reply {
    pub fn page(component: impl Component + 'static) -> Self {
        Reply::Page(Box::new(component))
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Reply::Html(markup.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Serialize `value` into a JSON reply.
    pub fn json(value: impl Serialize) -> Result<Self, DispatchError> {
        Ok(Reply::Json(serde_json::to_value(value)?))
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Reply::Redirect(target.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Page(_) => "page",
            Reply::Html(_) => "html",
            Reply::Text(_) => "text",
            Reply::Json(_) => "json",
            Reply::Redirect(_) => "redirect",
            Reply::Error(_) => "error",
        }
    }
}

impl From<HttpError> for Reply {
    fn from(err: HttpError) -> Self {
        Reply::Error(err)
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Page(c) => f.debug_tuple("Page").field(&c.name()).finish(),
            Reply::Html(s) => f.debug_tuple("Html").field(s).finish(),
            Reply::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Reply::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Reply::Redirect(s) => f.debug_tuple("Redirect").field(s).finish(),
            Reply::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}
