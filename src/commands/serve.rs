//! Serve command: one browser session behind the HTTP API.

use crate::config::Config;
use crate::justwatch::Session;
use crate::server;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Runs the HTTP server until Ctrl-C, then closes the browser.
pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind))?;

        let session =
            Session::launch(&self.config).await.context("Failed to start browser session")?;
        let session = Arc::new(Mutex::new(session));

        info!("Listening on {}", listener.local_addr()?);
        let served = axum::serve(listener, server::router(Arc::clone(&session)))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        session.lock().await.close().await;
        served.context("HTTP server failed")
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
