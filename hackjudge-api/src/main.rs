//! hackjudge-api - Hackathon judging REST service
//!
//! Serves CRUD endpoints for projects, judges, criteria and scores, a
//! full-snapshot read, and an SSE stream that pushes a fresh snapshot to
//! every connected viewer after each mutation.

use anyhow::{Context, Result};
use clap::Parser;
use hackjudge_api::config::{Args, ServerConfig};
use hackjudge_api::{build_router, AppState};
use hackjudge_common::db::Store;
use hackjudge_common::events::EventBus;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackjudge_api=info,hackjudge_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hackjudge-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = ServerConfig::resolve(args).context("Invalid configuration")?;
    info!(
        "Connection strategy: {} (max {} connections)",
        config.store.strategy, config.store.max_connections
    );
    if config.strict_references {
        info!("Strict score references enabled");
    }

    let store = Store::open(&config.database_url, &config.store)
        .await
        .context("Failed to open document store")?;

    let events = EventBus::new(config.event_capacity);
    let state = AppState::new(store.clone(), events, config.strict_references);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;
    info!("hackjudge-api listening on http://{}", config.listen);
    info!("Health check: http://{}/health", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
