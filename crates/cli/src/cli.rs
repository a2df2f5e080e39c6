//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Relay - ambient sensor collector and ingest server
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-relay",
    author,
    version,
    about = "Ambient sensor telemetry collector and ingest server",
    long_about = "Collects geolocation, ambient light, orientation and battery readings \n\
                  on a fixed interval, falls back to synthetic values for unavailable \n\
                  sensors, and posts every sample to an HTTP ingest endpoint. \n\n\
                  The same binary runs the ingest server that logs samples and \n\
                  forwards rows to a warehouse sink."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the collection loop against an ingest endpoint
    Collect(CollectArgs),

    /// Run the ingest server
    Serve(ServeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `collect` command
#[derive(Parser, Debug, Clone)]
pub struct CollectArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "TELEMETRY_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Delivery endpoint URL (overrides collector.endpoint and TELEMETRY_RELAY_ENDPOINT)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Tick interval in milliseconds (overrides collector.interval_ms)
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Request body shape (overrides collector.wire_format)
    #[arg(long, value_enum)]
    pub wire_format: Option<WireFormatArg>,

    /// Local storage file holding the instance id (overrides collector.storage_path)
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Load and validate configuration, print the effective settings and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "TELEMETRY_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address (overrides server.host)
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Listen port (overrides server.port)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Warehouse sink backend (overrides server.sink)
    #[arg(long, value_enum)]
    pub sink: Option<SinkArg>,

    /// Output directory for the file sink (overrides server.sink_path)
    #[arg(long)]
    pub sink_path: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor backend information
    #[arg(long)]
    pub sensors: bool,

    /// Show ingest server configuration
    #[arg(long)]
    pub server: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Request body shape
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormatArg {
    /// `/api/sensor-data` body
    SensorData,
    /// Schema-1 row for `/insert`
    Schema1,
    /// `/submit-sensor` body
    SubmitSensor,
}

impl From<WireFormatArg> for contracts::WireFormat {
    fn from(format: WireFormatArg) -> Self {
        match format {
            WireFormatArg::SensorData => Self::SensorData,
            WireFormatArg::Schema1 => Self::Schema1,
            WireFormatArg::SubmitSensor => Self::SubmitSensor,
        }
    }
}

/// Warehouse sink backend
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkArg {
    Log,
    File,
    Memory,
}

impl From<SinkArg> for contracts::SinkKind {
    fn from(sink: SinkArg) -> Self {
        match sink {
            SinkArg::Log => Self::Log,
            SinkArg::File => Self::File,
            SinkArg::Memory => Self::Memory,
        }
    }
}
