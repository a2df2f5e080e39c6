//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    collector: CollectorInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<ServerInfo>,
}

#[derive(Serialize)]
struct CollectorInfo {
    endpoint: String,
    interval_ms: u64,
    wire_format: String,
    storage_path: String,
}

#[derive(Serialize)]
struct SensorInfo {
    kind: &'static str,
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
}

#[derive(Serialize)]
struct ServerInfo {
    listen: String,
    dataset: String,
    table: String,
    table_schema2: String,
    sink: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sink_path: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn sensor_infos(config: &RelayConfig) -> Vec<SensorInfo> {
    let sensors = &config.sensors;
    let path = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());

    vec![
        SensorInfo {
            kind: "geolocation",
            backend: format!("{:?}", sensors.geolocation.backend),
            timeout_ms: Some(sensors.geolocation.timeout_ms),
            frequency_hz: None,
            device: None,
        },
        SensorInfo {
            kind: "ambient_light",
            backend: format!("{:?}", sensors.ambient_light.backend),
            timeout_ms: Some(sensors.ambient_light.timeout_ms),
            frequency_hz: Some(sensors.ambient_light.frequency_hz),
            device: path(&sensors.ambient_light.device_path),
        },
        SensorInfo {
            kind: "orientation",
            backend: format!("{:?}", sensors.orientation.backend),
            timeout_ms: None,
            frequency_hz: Some(sensors.orientation.frequency_hz),
            device: None,
        },
        SensorInfo {
            kind: "battery",
            backend: format!("{:?}", sensors.battery.backend),
            timeout_ms: Some(sensors.battery.timeout_ms),
            frequency_hz: None,
            device: path(&sensors.battery.supply_path),
        },
    ]
}

fn build_config_info(config: &RelayConfig, args: &InfoArgs) -> ConfigInfo {
    let collector = &config.collector;
    let server = &config.server;

    ConfigInfo {
        version: format!("{:?}", config.version),
        collector: CollectorInfo {
            endpoint: collector.endpoint.clone(),
            interval_ms: collector.interval_ms,
            wire_format: format!("{:?}", collector.wire_format),
            storage_path: collector.storage_path.display().to_string(),
        },
        sensors: if args.sensors {
            sensor_infos(config)
        } else {
            Vec::new()
        },
        server: args.server.then(|| ServerInfo {
            listen: format!("{}:{}", server.host, server.port),
            dataset: server.dataset.clone(),
            table: server.table.clone(),
            table_schema2: server.table_schema2.clone(),
            sink: format!("{:?}", server.sink),
            sink_path: (server.sink == contracts::SinkKind::File)
                .then(|| server.sink_path.display().to_string()),
        }),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Telemetry Relay Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let collector = &info.collector;
    println!("📡 Collector");
    println!("   ├─ Version: {}", info.version);
    if collector.endpoint.is_empty() {
        println!("   ├─ Endpoint: (not set)");
    } else {
        println!("   ├─ Endpoint: {}", collector.endpoint);
    }
    println!("   ├─ Interval: {} ms", collector.interval_ms);
    println!("   ├─ Wire format: {}", collector.wire_format);
    println!("   └─ Storage: {}", collector.storage_path);

    if !info.sensors.is_empty() {
        println!("\n🛰  Sensors ({})", info.sensors.len());
        for (i, sensor) in info.sensors.iter().enumerate() {
            let prefix = if i == info.sensors.len() - 1 { "└─" } else { "├─" };
            let mut details = Vec::new();
            if let Some(timeout_ms) = sensor.timeout_ms {
                details.push(format!("timeout {} ms", timeout_ms));
            }
            if let Some(frequency_hz) = sensor.frequency_hz {
                details.push(format!("{} Hz", frequency_hz));
            }
            if let Some(ref device) = sensor.device {
                details.push(device.clone());
            }
            println!(
                "   {} {} ({}) {}",
                prefix,
                sensor.kind,
                sensor.backend,
                details.join(", ")
            );
        }
    }

    if let Some(ref server) = info.server {
        println!("\n📥 Ingest Server");
        println!("   ├─ Listen: {}", server.listen);
        println!("   ├─ Dataset: {}", server.dataset);
        println!("   ├─ Tables: {}, {}", server.table, server.table_schema2);
        match server.sink_path {
            Some(ref path) => println!("   └─ Sink: {} ({})", server.sink, path),
            None => println!("   └─ Sink: {}", server.sink),
        }
    }

    println!();
}
