//! Request correlation ids.
//!
//! Reuses an incoming `x-request-id` when it looks sane, otherwise assigns a
//! fresh UUID v4. The id is stored on the context and echoed on the response.

use axum::http::header::HeaderName;
use uuid::Uuid;

use crate::http::request::X_REQUEST_ID;
use crate::http::RequestContext;
use crate::middleware::{ChainResult, Middleware, Next};

/// Longest client-supplied id accepted as-is.
const MAX_ID_LEN: usize = 128;

#[derive(Debug, Default, Clone, Copy)]
pub struct RequestId;

impl RequestId {
    pub fn new() -> Self {
        Self
    }
}

fn acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl Middleware for RequestId {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> ChainResult {
        let id = match ctx.header(X_REQUEST_ID) {
            Some(incoming) if acceptable(incoming) => incoming.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        ctx.set_request_id(id.clone());

        let mut response = next.run(ctx)?;
        response.set_header(HeaderName::from_static(X_REQUEST_ID), &id);
        Ok(response)
    }

    fn name(&self) -> &str {
        "request_id"
    }
}
