//! ginger-server entry point

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use ginger_server::{Config, GingerServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(model = %config.model.model, bind = %config.bind, "configuration loaded");

    GingerServer::new(&config)?.run().await
}
