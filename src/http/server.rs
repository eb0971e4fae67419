//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router whose fallback forwards every request to the App
//! - Wire up middleware (tracing, timeouts)
//! - Convert wire requests into `RequestContext` and `Response` back
//! - Bind server to listener, shut down gracefully
//!
//! # Design Decisions
//! - Dispatch is synchronous, so it runs on the blocking pool
//! - Bodies are buffered up to `security.max_body_size` before dispatch
//! - A failure no error boundary handled becomes a bare 500

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body as WireBody,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response as WireResponse},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::dispatch::App;
use crate::http::{RequestContext, Response};

/// How often expired pages are swept from the render cache.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// State injected into the fallback handler.
#[derive(Clone)]
struct ServerState {
    app: Arc<App>,
    max_body_size: usize,
}

/// HTTP server hosting one [`App`].
pub struct HttpServer {
    router: Router,
    app: Arc<App>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(app: Arc<App>, config: &AppConfig) -> Self {
        let state = ServerState {
            app: app.clone(),
            max_body_size: config.security.max_body_size,
        };
        let router = Self::build_router(config, state);
        Self { router, app }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: ServerState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(config.timeouts.request())),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.app.route_count(),
            "HTTP server starting"
        );

        if let Some(cache) = self.app.cache().cloned() {
            let mut stop = shutdown.resubscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(CACHE_PURGE_INTERVAL);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let purged = cache.purge_expired();
                            if purged > 0 {
                                tracing::debug!(purged, remaining = cache.len(), "Purged expired pages");
                            }
                        }
                        _ = stop.recv() => break,
                    }
                }
            });
        }

        let service = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for mounting elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Forward one wire request to the dispatcher.
async fn dispatch_handler(State(state): State<ServerState>, request: Request) -> WireResponse {
    let (parts, body) = request.into_parts();

    // 1. Buffer Body
    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit = state.max_body_size, "Rejecting request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    // 2. Build Context
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut ctx = RequestContext::new(parts.method.clone(), target)
        .with_headers(parts.headers)
        .with_body(bytes);
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        ctx = ctx.with_client_addr(*addr);
    }

    // 3. Dispatch on the blocking pool
    let app = state.app.clone();
    match tokio::task::spawn_blocking(move || app.dispatch(ctx)).await {
        Ok(Ok(response)) => into_wire(response),
        Ok(Err(err)) => {
            tracing::error!(method = %parts.method, uri = %parts.uri, error = %err, "Unhandled dispatch error");
            (err.status(), "Internal Server Error").into_response()
        }
        Err(join_err) => {
            tracing::error!(method = %parts.method, uri = %parts.uri, error = %join_err, "Dispatch task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn into_wire(response: Response) -> WireResponse {
    let mut wire = WireResponse::new(WireBody::from(response.body.to_bytes()));
    *wire.status_mut() = response.status;
    *wire.headers_mut() = response.headers;
    wire
}
