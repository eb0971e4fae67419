//! Middleware chain.
//!
//! # Data Flow
//! ```text
//! App::dispatch
//!     → MiddlewareStack::run(ctx, endpoint)
//!     → filter entries whose scope matches ctx.path()  (registration order)
//!     → entry[0].handle(ctx, next)
//!         → next.run(ctx) → entry[1].handle(ctx, next) → … → endpoint(ctx)
//!     ← Response flows back out through every entry that called next
//! ```
//!
//! # Design Decisions
//! - Built once at startup, read-only while serving
//! - `Next` is consumed by `run`, so a step can call it at most once;
//!   not calling it short-circuits the chain
//! - An `Err` from a step unwinds straight to the dispatcher's error boundary
//! - Scopes are path prefixes matched on segment boundaries:
//!   `/admin` covers `/admin` and `/admin/users`, not `/administrator`

pub mod headers;
pub mod rate_limit;
pub mod request_id;

use crate::error::DispatchError;
use crate::http::{RequestContext, Response};
use crate::routing::matcher::normalize_path;

pub use headers::SecurityHeaders;
pub use rate_limit::RateLimiter;
pub use request_id::RequestId;

/// Result of running (part of) the chain.
pub type ChainResult = Result<Response, DispatchError>;

/// The terminal step of the chain: handler, render, hydrate.
pub type Endpoint<'a> = dyn Fn(&mut RequestContext) -> ChainResult + 'a;

/// A request interceptor.
pub trait Middleware: Send + Sync {
    /// Inspect or modify `ctx`, then either call `next.run(ctx)` or answer
    /// directly.
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> ChainResult;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapter turning a closure into a [`Middleware`].
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut RequestContext, Next<'_>) -> ChainResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut RequestContext, Next<'_>) -> ChainResult + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> ChainResult {
        (self.f)(ctx, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// "Everything after me" for one step of the chain.
pub struct Next<'a> {
    remaining: &'a [&'a MiddlewareEntry],
    endpoint: &'a Endpoint<'a>,
}

impl<'a> Next<'a> {
    /// Run the rest of the chain and, finally, the endpoint.
    pub fn run(self, ctx: &mut RequestContext) -> ChainResult {
        match self.remaining.split_first() {
            Some((entry, rest)) => {
                tracing::trace!(middleware = %entry.middleware.name(), seq = entry.seq, "Entering middleware");
                entry.middleware.handle(
                    ctx,
                    Next {
                        remaining: rest,
                        endpoint: self.endpoint,
                    },
                )
            }
            None => (self.endpoint)(ctx),
        }
    }
}

/// A registered middleware with its order and optional scope.
pub struct MiddlewareEntry {
    seq: usize,
    scope: Option<String>,
    middleware: Box<dyn Middleware>,
}

impl MiddlewareEntry {
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn name(&self) -> &str {
        self.middleware.name()
    }

    /// Global entries apply everywhere; scoped ones on a segment-aligned prefix.
    pub fn applies_to(&self, path: &str) -> bool {
        match &self.scope {
            None => true,
            Some(prefix) => scope_matches(prefix, normalize_path(path)),
        }
    }
}

fn scope_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Ordered middleware registrations.
#[derive(Default)]
pub struct MiddlewareStack {
    entries: Vec<MiddlewareEntry>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a middleware that applies to every request.
    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        self.insert(None, Box::new(middleware));
    }

    /// Register a middleware limited to paths under `prefix`.
    pub fn push_scoped(&mut self, prefix: &str, middleware: impl Middleware + 'static) {
        let prefix = normalize_path(prefix).to_string();
        self.insert(Some(prefix), Box::new(middleware));
    }

    fn insert(&mut self, scope: Option<String>, middleware: Box<dyn Middleware>) {
        let seq = self.entries.len();
        tracing::debug!(middleware = %middleware.name(), seq, scope = ?scope, "Registered middleware");
        self.entries.push(MiddlewareEntry {
            seq,
            scope,
            middleware,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MiddlewareEntry] {
        &self.entries
    }

    /// Names of the entries that apply to `path`, in execution order.
    pub fn plan(&self, path: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.applies_to(path))
            .map(MiddlewareEntry::name)
            .collect()
    }

    /// Compose the applicable entries around `endpoint` and run once.
    pub fn run(&self, ctx: &mut RequestContext, endpoint: &Endpoint<'_>) -> ChainResult {
        let active: Vec<&MiddlewareEntry> = self
            .entries
            .iter()
            .filter(|e| e.applies_to(ctx.path()))
            .collect();

        Next {
            remaining: &active,
            endpoint,
        }
        .run(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, name: &'static str) -> FnMiddleware<impl Fn(&mut RequestContext, Next<'_>) -> ChainResult + Send + Sync> {
        let log = log.clone();
        FnMiddleware::new(name, move |ctx, next| {
            log.lock().unwrap().push(name.to_string());
            next.run(ctx)
        })
    }

    fn endpoint(log: &Log) -> impl Fn(&mut RequestContext) -> ChainResult + '_ {
        move |_ctx: &mut RequestContext| {
            log.lock().unwrap().push("handler".to_string());
            Ok(Response::text("ok"))
        }
    }

    #[test]
    fn test_runs_in_registration_order() {
        let log: Log = Arc::default();
        let mut stack = MiddlewareStack::new();
        stack.push(recorder(&log, "a"));
        stack.push(recorder(&log, "b"));
        stack.push(recorder(&log, "c"));

        let mut ctx = RequestContext::get("/");
        let res = stack.run(&mut ctx, &endpoint(&log)).unwrap();

        assert_eq!(res.body, crate::http::Body::Text("ok".into()));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "handler"]);
    }

    #[test]
    fn test_short_circuit_stops_chain() {
        let log: Log = Arc::default();
        let mut stack = MiddlewareStack::new();
        stack.push(recorder(&log, "a"));
        let l = log.clone();
        stack.push(FnMiddleware::new("b", move |_ctx, _next| {
            l.lock().unwrap().push("b".to_string());
            Ok(Response::error(axum::http::StatusCode::FORBIDDEN, "no"))
        }));
        stack.push(recorder(&log, "c"));

        let mut ctx = RequestContext::get("/");
        let res = stack.run(&mut ctx, &endpoint(&log)).unwrap();

        assert_eq!(res.status, axum::http::StatusCode::FORBIDDEN);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_error_unwinds() {
        let log: Log = Arc::default();
        let mut stack = MiddlewareStack::new();
        stack.push(FnMiddleware::new("fails", |_ctx, _next| {
            Err(DispatchError::middleware("fails", "boom"))
        }));
        stack.push(recorder(&log, "after"));

        let mut ctx = RequestContext::get("/");
        let err = stack.run(&mut ctx, &endpoint(&log)).unwrap_err();

        assert!(matches!(err, DispatchError::Middleware { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wraps_response() {
        let mut stack = MiddlewareStack::new();
        stack.push(FnMiddleware::new("tag", |ctx, next| {
            let res = next.run(ctx)?;
            Ok(res.with_status(axum::http::StatusCode::ACCEPTED))
        }));

        let mut ctx = RequestContext::get("/");
        let res = stack
            .run(&mut ctx, &|_ctx: &mut RequestContext| Ok(Response::text("x")))
            .unwrap();
        assert_eq!(res.status, axum::http::StatusCode::ACCEPTED);
    }

    #[test]
    fn test_scoped_entries() {
        let log: Log = Arc::default();
        let mut stack = MiddlewareStack::new();
        stack.push(recorder(&log, "global"));
        stack.push_scoped("/admin/", recorder(&log, "admin"));

        assert_eq!(stack.plan("/admin"), vec!["global", "admin"]);
        assert_eq!(stack.plan("/admin/users"), vec!["global", "admin"]);
        assert_eq!(stack.plan("/administrator"), vec!["global"]);
        assert_eq!(stack.plan("/"), vec!["global"]);

        let mut ctx = RequestContext::get("/public");
        stack.run(&mut ctx, &endpoint(&log)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["global", "handler"]);
    }

    #[test]
    fn test_scope_matches() {
        assert!(scope_matches("/", "/anything"));
        assert!(scope_matches("/api", "/api"));
        assert!(scope_matches("/api", "/api/v1"));
        assert!(!scope_matches("/api", "/apix"));
        assert!(!scope_matches("/api", "/"));
    }
}
