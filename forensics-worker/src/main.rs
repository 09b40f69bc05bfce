//! forensics-worker - signal fusion microservice
//!
//! Serves `POST /internal/forensics/v1/fuse`: fuses weak, heterogeneous
//! signals about a set of sources into calibrated per-source probabilities
//! with confidence intervals and ranked contributors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use forensics_common::config::{resolve_config, CONFIG_PATH_ENV};
use forensics_worker::{build_router, logging, AppState};

/// Command-line arguments for forensics-worker
#[derive(Parser, Debug)]
#[command(name = "forensics-worker")]
#[command(about = "Signal fusion microservice")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config file)
    #[arg(long, env = "FORENSICS_WORKER_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "FORENSICS_WORKER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before config so resolution is logged
    let logging = logging::init();

    let args = Args::parse();

    let mut config = resolve_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    logging.apply_config(&config.logging)?;

    info!(
        "Starting forensics-worker v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        em_iterations = config.em_iterations,
        max_signals = config.max_signals,
        max_cells = config.max_cells,
        max_body_bytes = config.max_body_bytes,
        "Fusion settings"
    );

    let state = AppState::new(&config);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on http://{}", local_addr);
    info!("Health check: http://{}/health", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
