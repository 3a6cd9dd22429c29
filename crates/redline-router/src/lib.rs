//! Redline Router
//!
//! HTTP front end for the comparison pipeline: synchronous and queued
//! comparisons, job status and progress polling, health.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod jobs;

use config::RouterConfig;
use handlers::{create_router, AppState};
use redline_service::{init_logging, SettingsError, SettingsFactory};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Router error
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the Router HTTP server
///
/// Builds the pipeline factory and job store, then serves until Ctrl+C.
pub async fn start_server(config: RouterConfig) -> Result<(), RouterError> {
    init_logging();

    info!("Starting Redline Router");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Parser: {}, agents: {}, model: {}",
        config.settings.parser_type, config.settings.agent_type, config.settings.model_name
    );

    let factory = SettingsFactory::new(config.settings.clone())?;
    let state = AppState::new(Arc::new(factory));
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Router listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .map_err(|e| RouterError::Server(e.to_string()))?;

    Ok(())
}
