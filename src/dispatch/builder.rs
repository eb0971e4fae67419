//! Registration surface.
//!
//! Routes, middleware, the error boundary and the bootstrap generator are
//! collected here at startup. `build` freezes everything into an [`App`].

use axum::http::Method;

use crate::config::AppConfig;
use crate::dispatch::app::{App, ErrorBoundary, Handler};
use crate::dispatch::cache::RenderCache;
use crate::dispatch::hydration::{HydrationInjector, ScriptGenerator};
use crate::dispatch::reply::Reply;
use crate::error::{DispatchError, RouteError};
use crate::http::{RequestContext, Response};
use crate::middleware::{
    ChainResult, FnMiddleware, Middleware, MiddlewareStack, Next, RateLimiter, RequestId,
    SecurityHeaders,
};
use crate::routing::RouteTable;

pub struct AppBuilder {
    config: AppConfig,
    routes: RouteTable<Handler>,
    middleware: MiddlewareStack,
    error_boundary: Option<ErrorBoundary>,
    generator: Option<Box<dyn ScriptGenerator>>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            routes: RouteTable::new(),
            middleware: MiddlewareStack::new(),
            error_boundary: None,
            generator: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register `handler` for `method` and `pattern` (`/users/:id`).
    pub fn route<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.routes.insert(method, pattern, Box::new(handler))?;
        Ok(self)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut RequestContext) -> Result<Reply, DispatchError> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Add a global middleware. Registration order is execution order.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Add a global middleware written as a closure.
    pub fn use_fn<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut RequestContext, Next<'_>) -> ChainResult + Send + Sync + 'static,
    {
        self.use_middleware(FnMiddleware::new(name, f))
    }

    /// Add a middleware that only runs for paths under `prefix`.
    pub fn use_scoped(&mut self, prefix: &str, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push_scoped(prefix, middleware);
        self
    }

    pub fn use_scoped_fn<F>(&mut self, prefix: &str, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut RequestContext, Next<'_>) -> ChainResult + Send + Sync + 'static,
    {
        self.use_scoped(prefix, FnMiddleware::new(name, f))
    }

    /// Register request id, security headers and rate limiting as configured.
    pub fn use_stock_middleware(&mut self) -> &mut Self {
        self.use_middleware(RequestId);
        if self.config.security.enable_headers {
            self.use_middleware(SecurityHeaders);
        }
        if self.config.rate_limit.enabled {
            let limiter = RateLimiter::from_config(&self.config.rate_limit);
            self.use_middleware(limiter);
        }
        self
    }

    /// Turn dispatch failures into a response instead of returning them.
    pub fn error_boundary<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&DispatchError, &RequestContext) -> Response + Send + Sync + 'static,
    {
        self.error_boundary = Some(Box::new(f));
        self
    }

    /// Replace the default JSON bootstrap generator.
    pub fn script_generator(&mut self, generator: impl ScriptGenerator + 'static) -> &mut Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn build(self) -> App {
        let mut hydration = HydrationInjector::from_config(&self.config.hydration);
        if let Some(generator) = self.generator {
            hydration = hydration.with_generator(generator);
        }

        let cache = self
            .config
            .cache
            .enabled
            .then(|| RenderCache::new(self.config.cache.max_entries));

        tracing::info!(
            routes = self.routes.len(),
            middleware = self.middleware.len(),
            cache = cache.is_some(),
            hydration = hydration.is_enabled(),
            "Application built"
        );

        App::new(
            self.routes,
            self.middleware,
            self.error_boundary,
            hydration,
            cache,
            self.config.render,
        )
    }
}
