//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;

use ssr_engine::component::{el, Node};
use ssr_engine::{App, AppConfig, HttpServer, RenderError, Shutdown, Template};

/// Config without the document shell, so pages serialize as written.
pub fn bare_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.render.wrap_document = false;
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// A page whose body is `<body><h1>{heading}</h1></body>`.
pub fn heading_page(heading: &str) -> Template<String> {
    Template::new("heading", heading.to_string(), |h: &String| -> Result<Node, RenderError> {
        Ok(el("body").child(el("h1").child(h.as_str())).into())
    })
}

/// Append-only log shared between closures and the test body.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Start `app` on an ephemeral port. Returns its address and the shutdown handle.
pub async fn start_server(app: App, config: &AppConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(Arc::new(app), config);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}
