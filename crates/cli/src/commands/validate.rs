//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{
    AmbientLightBackend, BatteryBackend, GeolocationBackend, OrientationBackend, RelayConfig,
    SinkKind,
};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    endpoint: String,
    interval_ms: u64,
    wire_format: String,
    listen: String,
    sink: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    endpoint: config.collector.endpoint.clone(),
                    interval_ms: config.collector.interval_ms,
                    wire_format: format!("{:?}", config.collector.wire_format),
                    listen: format!("{}:{}", config.server.host, config.server.port),
                    sink: format!("{:?}", config.server.sink),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.collector.endpoint.trim().is_empty() {
        warnings.push("collector.endpoint is empty - `collect` needs --endpoint".to_string());
    }

    let sensors = &config.sensors;
    let unsupported = [
        (
            "geolocation",
            sensors.geolocation.backend == GeolocationBackend::Unsupported,
        ),
        (
            "ambient_light",
            sensors.ambient_light.backend == AmbientLightBackend::Unsupported,
        ),
        (
            "orientation",
            sensors.orientation.backend == OrientationBackend::Unsupported,
        ),
        (
            "battery",
            sensors.battery.backend == BatteryBackend::Unsupported,
        ),
    ];
    for (sensor, is_unsupported) in unsupported {
        if is_unsupported {
            warnings.push(format!(
                "sensors.{sensor} is unsupported - every sample will carry a synthetic value"
            ));
        }
    }

    // Interval shorter than the slowest acquisition budget
    let slowest_ms = sensors
        .geolocation
        .timeout_ms
        .max(sensors.ambient_light.timeout_ms)
        .max(sensors.battery.timeout_ms);
    if config.collector.interval_ms < slowest_ms {
        warnings.push(format!(
            "collector.interval_ms ({}) is shorter than the slowest sensor timeout ({} ms) - ticks may be skipped",
            config.collector.interval_ms, slowest_ms
        ));
    }

    if config.server.sink == SinkKind::Memory {
        warnings.push("server.sink is memory - rows are lost when the server exits".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Endpoint: {}", summary.endpoint);
            println!("  Interval: {} ms", summary.interval_ms);
            println!("  Wire format: {}", summary.wire_format);
            println!("  Server: {}", summary.listen);
            println!("  Sink: {}", summary.sink);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
