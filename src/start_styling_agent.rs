//! Startup helpers for the styling assistant server.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::server::{self, AppState};

/// Run the server until Ctrl-C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting styling agent v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(initialize()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e:#}");
            return ExitCode::from(1);
        }
    };

    let port = state.config.server.port;
    if state.config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; chat requests will fail until it is configured");
    }

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Load configuration from the environment and build application state.
///
/// # Errors
/// Returns an error if the configuration is invalid or state creation fails.
pub async fn initialize() -> anyhow::Result<Arc<AppState>> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!(model = %config.gemini.chat_model, image_model = %config.gemini.image_model, "generative models");
    AppState::from_config(config).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
