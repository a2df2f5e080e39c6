//! `serve` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use tracing::info;

use super::{load_config, shutdown_signal};
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;

    if args.metrics_port > 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let server = &config.server;
    info!(
        host = %server.host,
        port = server.port,
        sink = ?server.sink,
        dataset = %server.dataset,
        "Starting ingest server..."
    );

    ingest_server::serve(server, shutdown_signal())
        .await
        .context("Ingest server failed")?;

    info!("Telemetry Relay server finished");
    Ok(())
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut RelayConfig, args: &ServeArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding listen host from CLI");
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding listen port from CLI");
        config.server.port = port;
    }
    if let Some(sink) = args.sink {
        config.server.sink = sink.into();
    }
    if let Some(ref sink_path) = args.sink_path {
        config.server.sink_path = sink_path.clone();
    }
}
