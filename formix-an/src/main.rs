//! formix-an - Response analytics service
//!
//! Records form visits and completed submissions into daily rollups and
//! serves materialized per-field reports.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use formix_common::config;
use formix_common::db::init_database;
use tokio::signal;
use tracing::{info, warn};

use formix_an::cli::Args;
use formix_an::services::engine::EngineSettings;
use formix_an::{build_router, logging, AnalyticsEngine, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::resolve(args.into_overrides()).context("Failed to resolve configuration")?;

    logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting formix-an v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if config.config_file_loaded {
        info!("Config file: {}", config.config_file.display());
    } else {
        warn!(
            "Config file {} not found, using defaults",
            config.config_file.display()
        );
    }
    info!("Database: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let engine = Arc::new(AnalyticsEngine::with_default_codec(
        pool,
        EngineSettings::from(&config),
    ));
    let app = build_router(AppState::new(engine));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
