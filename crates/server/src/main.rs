//! moodtunes server: emotion-driven music recommendations over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{AppConfig, AppState, RequestOrchestrator, create_router};

#[derive(Parser, Debug)]
#[command(name = "moodtunes-server", version, about = "Emotion-driven music recommendations")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "MOODTUNES_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding server.host/server.port
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,pipeline=debug")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let addr = match cli.bind {
        Some(addr) => addr,
        None => config
            .server
            .socket_addr()
            .context("Invalid server.host/server.port")?,
    };

    info!("Starting moodtunes server v{}", env!("CARGO_PKG_VERSION"));
    info!("Classifier: {}", config.classifier.endpoint);
    info!("Catalog: {}", config.catalog.base_url);
    info!("Upload storage: {}", config.storage.temp_dir().display());

    let orchestrator = RequestOrchestrator::from_config(&config)?;
    let app = create_router(AppState::new(orchestrator), config.server.max_upload_bytes);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
