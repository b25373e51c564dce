//! Server setup and lifecycle for the ginger server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::routes::create_router;
use crate::state::AppState;

/// The ginger HTTP server.
pub struct GingerServer {
    bind: SocketAddr,
    state: Arc<AppState>,
}

impl GingerServer {
    /// Creates a server with production state for `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let state = AppState::new(config).context("failed to build model client")?;
        Ok(Self::with_state(config.bind, Arc::new(state)))
    }

    /// Creates a server from an existing `AppState`.
    pub fn with_state(bind: SocketAddr, state: Arc<AppState>) -> Self {
        Self { bind, state }
    }

    /// Runs the HTTP server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);
        let listener = TcpListener::bind(self.bind)
            .await
            .with_context(|| format!("failed to bind to {}", self.bind))?;

        tracing::info!(addr = %self.bind, "ginger server starting");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        tracing::info!("ginger server stopped");
        Ok(())
    }
}

/// Resolves on the first shutdown signal. A handler that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        },
    }
}
