//! Per-request orchestration.
//!
//! # State machine
//! ```text
//! received → matched ──→ chain running ──→ handler → rendered → hydrated → finalized
//!          ↘ no route → 404 (no chain)  ↘ short-circuit ──────────────────↗
//!                                       ↘ error → error boundary ─────────↗
//! ```

use std::time::{Duration, Instant};

use axum::http::Method;

use crate::component::document::{is_document, wrap_document, Head};
use crate::component::{render_component, to_vnode, Component};
use crate::config::RenderConfig;
use crate::dispatch::cache::{CacheKey, CachedPage, RenderCache};
use crate::dispatch::hydration::HydrationInjector;
use crate::dispatch::reply::Reply;
use crate::dispatch::builder::AppBuilder;
use crate::error::DispatchError;
use crate::html::render_to_string;
use crate::http::{Body, RequestContext, Response};
use crate::middleware::MiddlewareStack;
use crate::routing::{RouteMatch, RouteTable};

/// A route handler.
pub type Handler = Box<dyn Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync>;

/// Maps an escaped failure to a response.
pub type ErrorBoundary = Box<dyn Fn(&DispatchError, &RequestContext) -> Response + Send + Sync>;

/// The frozen application: routes, middleware and render settings.
///
/// Shared read-only between request threads; the render cache is the only
/// mutable state.
pub struct App {
    routes: RouteTable<Handler>,
    middleware: MiddlewareStack,
    error_boundary: Option<ErrorBoundary>,
    hydration: HydrationInjector,
    cache: Option<RenderCache>,
    render: RenderConfig,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    pub(crate) fn new(
        routes: RouteTable<Handler>,
        middleware: MiddlewareStack,
        error_boundary: Option<ErrorBoundary>,
        hydration: HydrationInjector,
        cache: Option<RenderCache>,
        render: RenderConfig,
    ) -> Self {
        Self {
            routes,
            middleware,
            error_boundary,
            hydration,
            cache,
            render,
        }
    }

    pub fn cache(&self) -> Option<&RenderCache> {
        self.cache.as_ref()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Handle one request end to end.
    ///
    /// Failures go to the error boundary when one is registered; otherwise
    /// they are returned to the caller.
    pub fn dispatch(&self, mut ctx: RequestContext) -> Result<Response, DispatchError> {
        let started = Instant::now();
        let method = ctx.method().clone();

        // 1. Match Route
        let Some(found) = self.lookup(&method, ctx.path()) else {
            tracing::warn!(
                method = %method,
                path = %ctx.path(),
                allowed = ?self.routes.allowed_methods(ctx.path()),
                "No route matched"
            );
            return Ok(finalize(Response::not_found(), &method));
        };
        ctx.set_route(found.pattern(), found.params.clone());
        let handler = found.handler();

        tracing::debug!(method = %method, path = %ctx.path(), route = %found.pattern(), "Dispatching request");

        // 2. Run Chain (the endpoint renders and hydrates)
        let endpoint = |ctx: &mut RequestContext| self.run_endpoint(handler, ctx);
        let response = match self.middleware.run(&mut ctx, &endpoint) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    method = %method,
                    path = %ctx.path(),
                    request_id = ?ctx.request_id(),
                    error = %err,
                    "Request failed"
                );
                match &self.error_boundary {
                    Some(boundary) => boundary(&err, &ctx),
                    None => return Err(err),
                }
            }
        };

        // 3. Finalize
        let response = finalize(response, &method);
        tracing::info!(
            method = %method,
            path = %ctx.path(),
            status = response.status.as_u16(),
            request_id = ?ctx.request_id(),
            elapsed_ms = millis(started.elapsed()),
            "Request completed"
        );
        Ok(response)
    }

    /// Route lookup with `HEAD` falling back to `GET`.
    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, Handler>> {
        self.routes.lookup(method, path).or_else(|| {
            if *method == Method::HEAD {
                self.routes.lookup(&Method::GET, path)
            } else {
                None
            }
        })
    }

    fn run_endpoint(&self, handler: &Handler, ctx: &mut RequestContext) -> Result<Response, DispatchError> {
        let reply = handler(ctx)?;
        tracing::trace!(kind = reply.kind(), "Handler replied");

        Ok(match reply {
            Reply::Page(component) => return self.render_page(component, ctx),
            Reply::Html(markup) => Response::html(markup),
            Reply::Text(text) => Response::text(text),
            Reply::Json(value) => Response::json(value),
            Reply::Redirect(target) => Response::redirect(target),
            Reply::Error(err) => Response::error(err.status, err.message),
        })
    }

    fn cache_key(&self, component: &dyn Component, ctx: &RequestContext) -> Option<(CacheKey, Duration)> {
        let ttl = component.cache_duration();
        if self.cache.is_none() || !component.cacheable() || ttl.is_zero() {
            return None;
        }
        let route = ctx.route()?;
        Some((CacheKey::new(ctx.method().clone(), route, ctx.params().clone()), ttl))
    }

    fn render_page(
        &self,
        mut component: Box<dyn Component>,
        ctx: &mut RequestContext,
    ) -> Result<Response, DispatchError> {
        let cached = self.cache_key(component.as_ref(), ctx);

        if let (Some(cache), Some((key, _))) = (&self.cache, &cached) {
            if let Some(page) = cache.get(key) {
                tracing::debug!(route = %key.route, "Render cache hit");
                for (name, value) in page.state {
                    ctx.provide_state(name, value);
                }
                ctx.scripts_mut().append(&page.scripts);
                let markup = self.hydration.apply(page.body, ctx)?;
                return Ok(Response {
                    status: page.status,
                    headers: page.headers,
                    body: Body::Html(markup),
                });
            }
            tracing::debug!(route = %key.route, "Render cache miss");
        }

        let state_before = cached.as_ref().map(|_| ctx.state().clone());
        let scripts_before = ctx.scripts().mark();

        // 1. Lifecycle + conversion
        let body = render_component(component.as_mut(), ctx)?;

        // 2. Document shell
        let node = if self.render.wrap_document && !is_document(&body) {
            let extra = match component.head() {
                Some(node) => vec![to_vnode(node, ctx)?],
                None => Vec::new(),
            };
            let head = Head {
                title: component.title(),
                description: component.meta_description(),
                extra,
            };
            wrap_document(body, head, &self.render)?
        } else {
            body
        };

        // 3. Serialize
        let markup = render_to_string(&node);

        if let (Some(cache), Some((key, ttl)), Some(before)) = (&self.cache, cached, state_before) {
            let state = ctx
                .state()
                .iter()
                .filter(|(name, value)| before.get(name.as_str()) != Some(*value))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            let page = CachedPage::new(markup.clone())
                .with_hydration(state, ctx.scripts().since(scripts_before));
            cache.insert(key, page, ttl);
        }

        // 4. Hydrate
        let markup = self.hydration.apply(markup, ctx)?;
        Ok(Response::html(markup))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Fill derived headers; `HEAD` keeps headers but loses the body.
fn finalize(response: Response, method: &Method) -> Response {
    let response = response.finalize();
    if *method == Method::HEAD {
        response.without_body()
    } else {
        response
    }
}
