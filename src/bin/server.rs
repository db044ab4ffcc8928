//! # Ingest server
//!
//! Runs the ingest job HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ingest_api::{
    config::{Args, MonitoringConfig},
    Server, ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::load(&args).context("Failed to load configuration")?;

    init_logging(&config.monitoring)?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting ingest server"
    );

    let server = Server::new(config)
        .await
        .context("Failed to initialize server")?;
    server.start().await?;

    Ok(())
}

fn init_logging(monitoring: &MonitoringConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&monitoring.log_level)
        .with_context(|| format!("Invalid log level '{}'", monitoring.log_level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if monitoring.structured_logging {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
