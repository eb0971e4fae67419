//! `ssr-engine` demo server.
//!
//! ```text
//! ssr-engine [--config app.toml] [--bind 127.0.0.1:3000]
//! ```
//!
//! Mounts a small site:
//! - `/`            home page (Template, mount script)
//! - `/about`       static page (exact route, beats `/:page`)
//! - `/users/:id`   user page (Component impl, hydration state, cached 30s)
//! - `/:page`       generic page
//! - `/api/users/:id` JSON, under a scoped `cache-control` middleware

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use ssr_engine::component::{el, Node};
use ssr_engine::config::{load_config, validate_config, AppConfig};
use ssr_engine::observability::init_logging;
use ssr_engine::{
    App, AppBuilder, Component, DispatchError, HttpError, HttpServer, RenderError, Reply,
    RequestContext, Response, RouteError, Shutdown, Template,
};

#[derive(Debug, Parser)]
#[command(name = "ssr-engine", version, about = "Server-side rendering demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: String,
}

fn find_user(id: u64) -> Option<User> {
    const NAMES: [&str; 3] = ["Ada", "Grace", "Edsger"];
    let name = NAMES.get(usize::try_from(id).ok()?.checked_sub(1)?)?;
    Some(User {
        id,
        name: (*name).to_string(),
    })
}

fn parse_id(ctx: &RequestContext) -> Result<u64, HttpError> {
    ctx.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| HttpError::bad_request("user id must be a number"))
}

/// Profile page for one user.
struct UserPage {
    user: User,
}

impl Component for UserPage {
    fn name(&self) -> &str {
        "user_page"
    }

    fn pre_render(&mut self, ctx: &mut RequestContext) -> Result<(), RenderError> {
        ctx.provide_state("user", &self.user);
        Ok(())
    }

    fn render(&self) -> Result<Node, RenderError> {
        Ok(el("main")
            .child(el("h1").child(self.user.name.as_str()))
            .child(el("p").child(format!("User #{}", self.user.id)))
            .child(el("a").attr("href", "/").child("Back"))
            .into())
    }

    fn title(&self) -> Option<String> {
        Some(format!("{} | Users", self.user.name))
    }

    fn meta_description(&self) -> Option<String> {
        Some(format!("Profile of {}", self.user.name))
    }

    fn mount_script(&self) -> Option<String> {
        Some("window.__user = JSON.parse(document.getElementById('ssr-state').textContent).user;".into())
    }

    fn cache_duration(&self) -> Duration {
        Duration::from_secs(30)
    }
}

fn home() -> Template {
    Template::new("home", (), |_| {
        Ok(el("main")
            .child(el("h1").child("Welcome"))
            .child(
                el("ul").children(
                    (1..=3)
                        .filter_map(find_user)
                        .map(|u| el("li").child(el("a").attr("href", format!("/users/{}", u.id)).child(u.name))),
                ),
            )
            .into())
    })
    .with_title("Home")
    .with_meta_description("Server-side rendering demo")
    .with_mount_script("console.log('home mounted')")
}

fn build_app(config: AppConfig) -> Result<App, RouteError> {
    let mut app = AppBuilder::new(config);

    app.use_stock_middleware()
        .use_scoped_fn("/api", "no_store", |ctx, next| {
            let mut res = next.run(ctx)?;
            res.headers
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(res)
        })
        .error_boundary(|err, ctx| {
            let id = ctx.request_id().unwrap_or("-");
            Response::error(err.status(), format!("Something went wrong (request {})", id))
        });

    app.get("/", |_ctx| Ok(Reply::page(home())))?
        .get("/about", |_ctx| {
            Ok(Reply::page(
                Template::new("about", (), |_| {
                    Ok(el("main").child(el("h1").child("About")).into())
                })
                .with_title("About")
                .cache_for(Duration::from_secs(300)),
            ))
        })?
        .get("/users/:id", |ctx| {
            let id = match parse_id(ctx) {
                Ok(id) => id,
                Err(e) => return Ok(e.into()),
            };
            match find_user(id) {
                Some(user) => Ok(Reply::page(UserPage { user })),
                None => Ok(HttpError::not_found(format!("no user {}", id)).into()),
            }
        })?
        .get("/:page", |ctx| {
            let page = ctx.param("page").unwrap_or_default().to_string();
            Ok(Reply::page(
                Template::new("page", page, |page: &String| {
                    Ok(el("main").child(el("h1").child(page.as_str())).into())
                })
                .with_title_fn(|page| page.clone()),
            ))
        })?
        .get("/api/users/:id", |ctx| {
            let id = match parse_id(ctx) {
                Ok(id) => id,
                Err(e) => return Ok(e.into()),
            };
            match find_user(id) {
                Some(user) => Reply::json(user),
                None => Ok(HttpError::new(StatusCode::NOT_FOUND, "no such user").into()),
            }
        })?
        .post("/api/echo", |ctx| {
            let body = ctx
                .body_text()
                .ok_or_else(|| DispatchError::handler("body is not UTF-8"))?;
            Ok(Reply::text(body.to_string()))
        })?;

    Ok(app.build())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ssr_engine::config::ConfigError::Validation)?;
    }

    // 2. Logging
    init_logging(&config.observability)?;
    tracing::info!("ssr-engine v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        cache = config.cache.enabled,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    // 3. Build Application
    let app = Arc::new(build_app(config.clone())?);

    // 4. Serve
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    tokio::spawn(shutdown.clone().trigger_on_ctrl_c());
    let server = HttpServer::new(app, &config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
