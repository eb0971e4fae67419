//! Request-scoped context.
//!
//! # Responsibilities
//! - Carry method, path, query, headers and body for one request
//! - Carry path parameters extracted by the route table
//! - Provide a typed bag for values middleware and handlers stash
//! - Collect hydration state and scripts produced while rendering
//!
//! # Design Decisions
//! - Created at dispatch start, dropped at finalization, never shared
//! - Passed explicitly (`&mut`) through chain → handler → render
//! - Built from plain values so tests can replay a request without a socket

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{header::HeaderName, Extensions, HeaderMap, HeaderValue, Method};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::dispatch::hydration::ScriptBag;
use crate::routing::PathParams;

/// Header carrying the correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Everything the core knows about one in-flight request.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    client_addr: Option<SocketAddr>,
    params: PathParams,
    route: Option<String>,
    request_id: Option<String>,
    extensions: Extensions,
    state: Map<String, Value>,
    scripts: ScriptBag,
}

impl RequestContext {
    /// Build a context from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };

        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_addr: None,
            params: PathParams::new(),
            route: None,
            request_id: None,
            extensions: Extensions::new(),
            state: Map::new(),
            scripts: ScriptBag::default(),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add one header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_client_addr(mut self, addr: SocketAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of query parameter `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All query pairs in request order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    /// Path parameter captured by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Pattern of the matched route.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub(crate) fn set_route(&mut self, pattern: &str, params: PathParams) {
        self.route = Some(pattern.to_string());
        self.params = params;
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.request_id = Some(id.into());
    }

    /// Typed values stashed by middleware or handlers.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Publish a value to the client bootstrap state.
    ///
    /// Values that fail to serialize are skipped.
    pub fn provide_state(&mut self, key: impl Into<String>, value: impl Serialize) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.state.insert(key.into(), json);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping unserializable hydration state"),
        }
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    pub fn scripts(&self) -> &ScriptBag {
        &self.scripts
    }

    pub fn scripts_mut(&mut self) -> &mut ScriptBag {
        &mut self.scripts
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
