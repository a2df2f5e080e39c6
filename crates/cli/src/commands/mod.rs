//! Command implementations.

mod collect;
mod info;
mod serve;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::RelayConfig;
use tracing::{error, info};

use crate::error::CliError;

pub use collect::run_collect;
pub use info::run_info;
pub use serve::run_serve;
pub use validate::run_validate;

/// Load the configuration file, or defaults when no path is given.
///
/// `TELEMETRY_RELAY_*` environment overrides apply in both cases.
fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return config_loader::ConfigLoader::load_defaults()
            .context("Invalid environment overrides");
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
}
