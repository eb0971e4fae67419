//! Security response headers.
//!
//! # Responsibilities
//! - Add `x-content-type-options`, `x-frame-options` and `referrer-policy`
//!   to every response passing back through the chain
//!
//! # Design Decisions
//! - Headers already set by a handler win
//! - Runs after the continuation, so short-circuited responses from later
//!   steps are covered too

use axum::http::header::{HeaderName, HeaderValue};

use crate::http::RequestContext;
use crate::middleware::{ChainResult, Middleware, Next};

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityHeaders;

impl SecurityHeaders {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for SecurityHeaders {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> ChainResult {
        let mut response = next.run(ctx)?;
        for (name, value) in DEFAULT_HEADERS {
            if !response.headers.contains_key(*name) {
                response.headers.insert(
                    HeaderName::from_static(*name),
                    HeaderValue::from_static(*value),
                );
            }
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        "security_headers"
    }
}
