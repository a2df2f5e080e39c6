//! `collect` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use std::time::Duration;
use tracing::info;

use super::{load_config, shutdown_signal};
use crate::cli::CollectArgs;
use crate::error::CliError;
use crate::pipeline::{CollectOptions, CollectPipeline};

/// Execute the `collect` command
pub async fn run_collect(args: &CollectArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);

    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;
    if config.collector.endpoint.trim().is_empty() {
        return Err(CliError::MissingEndpoint.into());
    }

    info!(
        endpoint = %config.collector.endpoint,
        interval_ms = config.collector.interval_ms,
        wire_format = ?config.collector.wire_format,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let options = CollectOptions {
        config,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let stats = CollectPipeline::new(options)
        .run(shutdown_signal())
        .await
        .context("Collection failed")?;

    info!(
        ticks = stats.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        delivered = stats.delivery.delivered,
        "Collection finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut RelayConfig, args: &CollectArgs) {
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding endpoint from CLI");
        config.collector.endpoint = endpoint.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        config.collector.interval_ms = interval_ms;
    }
    if let Some(format) = args.wire_format {
        config.collector.wire_format = format.into();
    }
    if let Some(ref storage) = args.storage {
        config.collector.storage_path = storage.clone();
    }
}

/// Print effective settings for dry-run mode
fn print_config_summary(config: &RelayConfig) {
    let collector = &config.collector;
    let sensors = &config.sensors;

    println!("\n=== Collection Settings ===\n");
    println!("Collector:");
    println!("  Endpoint: {}", collector.endpoint);
    println!("  Interval: {} ms", collector.interval_ms);
    println!("  Wire format: {:?}", collector.wire_format);
    println!("  Storage: {}", collector.storage_path.display());

    println!("\nSensors:");
    println!(
        "  - geolocation: {:?} (timeout {} ms)",
        sensors.geolocation.backend, sensors.geolocation.timeout_ms
    );
    println!(
        "  - ambient_light: {:?} (timeout {} ms)",
        sensors.ambient_light.backend, sensors.ambient_light.timeout_ms
    );
    println!(
        "  - orientation: {:?} ({} Hz)",
        sensors.orientation.backend, sensors.orientation.frequency_hz
    );
    println!(
        "  - battery: {:?} (timeout {} ms)",
        sensors.battery.backend, sensors.battery.timeout_ms
    );

    println!();
}
