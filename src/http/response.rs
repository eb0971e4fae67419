//! Response envelope.
//!
//! # Responsibilities
//! - Hold status, headers and body produced by the dispatcher
//! - Provide constructors for the body kinds handlers reply with
//! - Fill in `content-type` during finalization
//!
//! # Design Decisions
//! - Plain owned data: the envelope crosses back from the blocking render
//!   thread to the async server task
//! - Writing to the wire is the server's job (`server.rs`)

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;

/// Response body kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Html(String),
    Text(String),
    Json(Value),
    /// Redirect target, sent as `location`.
    Redirect(String),
}

impl Body {
    fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Html(_) => Some("text/html; charset=utf-8"),
            Body::Text(_) => Some("text/plain; charset=utf-8"),
            Body::Json(_) => Some("application/json"),
            Body::Empty | Body::Redirect(_) => None,
        }
    }

    /// Body bytes as sent on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Empty | Body::Redirect(_) => Vec::new(),
            Body::Html(s) | Body::Text(s) => s.clone().into_bytes(),
            Body::Json(v) => v.to_string().into_bytes(),
        }
    }
}

/// Status, headers and body for one request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Body::Html(markup.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Body::Text(text.into()))
    }

    pub fn json(value: Value) -> Self {
        Self::new(StatusCode::OK, Body::Json(value))
    }

    /// `303 See Other` to `target`.
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::new(StatusCode::SEE_OTHER, Body::Redirect(target.into()))
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Body::Empty)
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "Not Found")
    }

    /// Plain-text error response.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, Body::Text(message.into()))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header. Invalid values are dropped with a warning.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: header::HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => tracing::warn!(header = %name, "Dropping invalid header value"),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Markup of an HTML body.
    pub fn html_body(&self) -> Option<&str> {
        match &self.body {
            Body::Html(s) => Some(s),
            _ => None,
        }
    }

    /// Fill in headers derived from the body.
    ///
    /// Existing headers are never overwritten.
    pub fn finalize(mut self) -> Self {
        if let Some(ct) = self.body.content_type() {
            if !self.headers.contains_key(header::CONTENT_TYPE) {
                self.headers
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
            }
        }
        if let Body::Redirect(target) = &self.body {
            if !self.headers.contains_key(header::LOCATION) {
                if let Ok(v) = HeaderValue::from_str(target) {
                    self.headers.insert(header::LOCATION, v);
                }
            }
        }
        self
    }

    /// Drop the body but keep its headers (for `HEAD`).
    pub fn without_body(mut self) -> Self {
        self.body = Body::Empty;
        self
    }
}
