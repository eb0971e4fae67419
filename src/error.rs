//! Error taxonomy for the rendering and dispatch core.
//!
//! # Design Decisions
//! - Registration errors (`RouteError`) are startup-fatal, never seen at runtime
//! - Markup errors are programmer errors surfaced while converting element trees
//! - `HttpError` is a structured reply, not a failure; handlers return it on purpose
//! - Everything a handler, middleware or component raises funnels into `DispatchError`

use axum::http::{Method, StatusCode};
use thiserror::Error;

/// Invalid virtual-node construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// Tag name is empty or not an identifier.
    #[error("invalid tag name `{0}`")]
    InvalidTag(String),

    /// Attribute name would break out of the start tag.
    #[error("invalid attribute name `{0}`")]
    InvalidAttribute(String),

    /// A void element was given children.
    #[error("void element <{0}> cannot have children")]
    VoidChildren(String),
}

/// Failure while turning a component into markup.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The element tree could not be converted into virtual nodes.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// A lifecycle hook or `render` of a component failed.
    #[error("component `{component}` failed: {message}")]
    Component { component: String, message: String },
}

impl RenderError {
    /// Build a component failure.
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Route registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Two routes for the same method share the same path shape.
    #[error("route conflict: {method} {path} is already registered")]
    Conflict { method: Method, path: String },

    /// The pattern could not be parsed.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A deliberate, status-coded error reply produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

/// Anything that escapes the middleware chain or the render step.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Lifecycle or markup failure while rendering a page.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// A middleware step raised an error.
    #[error("middleware `{middleware}` failed: {message}")]
    Middleware { middleware: String, message: String },

    /// A handler raised an error (as opposed to replying with `HttpError`).
    #[error("handler failed: {0}")]
    Handler(String),

    /// Serializing a JSON reply failed.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn middleware(middleware: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Middleware {
            middleware: middleware.into(),
            message: message.into(),
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Status code the default error boundary answers with.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<MarkupError> for DispatchError {
    fn from(err: MarkupError) -> Self {
        Self::Render(RenderError::Markup(err))
    }
}
