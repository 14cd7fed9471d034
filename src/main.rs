//! bucket-kv - key-value HTTP gateway over an object storage bucket
//!
//! Exposes get/set/delete/list over HTTP. Each (user, key) pair maps to one
//! object name in the configured bucket; values are stored as plain text
//! objects. An optional shared bearer token guards every route except the
//! liveness probe.

mod auth;
mod config;
mod errors;
mod metrics;
mod namespace;
mod routes;
mod server;
mod storage;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration comes first so LOG_LEVEL can seed the filter.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing with JSON output for structured logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    metrics::init_metrics().context("Failed to register metrics")?;

    info!(?config, "Configuration loaded");

    let storage = storage::create_backend(&config.backend)
        .context("Failed to initialize storage backend")?;
    info!(backend = ?config.backend.backend_type, "Storage backend initialized");

    let server = Server::new(config, storage);

    if let Err(e) = server.start(shutdown_signal()).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Received shutdown signal");
}
