//! Parish backend HTTP server

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use credential_core::{create_router, init, logging::setup_logging, ServiceConfig};

#[derive(Debug, Parser)]
#[command(name = "parish-server", about = "Parish backend API server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PARISH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if args.json_logs {
        config.logging = config.logging.with_json();
    }

    setup_logging(&config.logging)?;
    tracing::debug!(?config, "Configuration loaded");

    let state = init(&config).context("initializing service")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    tracing::info!(address = %config.bind_address, "Parish API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
