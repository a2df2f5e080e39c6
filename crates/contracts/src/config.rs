//! RelayConfig - Config Loader output
//!
//! Collector settings, sensor backends and ingest server settings. Every
//! section has defaults so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Collection loop and delivery settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Sensor backend selection
    #[serde(default)]
    pub sensors: SensorsConfig,

    /// Ingest server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Collector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Delivery endpoint URL (empty = must be given on the command line)
    #[serde(default)]
    pub endpoint: String,

    /// Tick interval (ms), must be > 0
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Request body shape
    #[serde(default)]
    pub wire_format: WireFormat,

    /// Local key/value storage file (holds the instance id)
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// How long a "delivered" notice stays visible (ms)
    #[serde(default = "default_success_notice_ms")]
    pub success_notice_ms: u64,

    /// How long a failure notice stays visible (ms)
    #[serde(default = "default_failure_notice_ms")]
    pub failure_notice_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            interval_ms: default_interval_ms(),
            wire_format: WireFormat::default(),
            storage_path: default_storage_path(),
            success_notice_ms: default_success_notice_ms(),
            failure_notice_ms: default_failure_notice_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".telemetry-relay/storage.json")
}

fn default_success_notice_ms() -> u64 {
    3000
}

fn default_failure_notice_ms() -> u64 {
    5000
}

/// Request body shape used by the delivery client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// `/api/sensor-data` shape (camelCase, nested readings)
    #[default]
    SensorData,
    /// Schema-1 row with `sensor_record` as a JSON-encoded string
    Schema1,
    /// `/submit-sensor` shape (battery + location, null when synthetic)
    SubmitSensor,
}

/// Sensor backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorsConfig {
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    #[serde(default)]
    pub ambient_light: AmbientLightConfig,

    #[serde(default)]
    pub orientation: OrientationConfig,

    #[serde(default)]
    pub battery: BatteryConfig,
}

/// Geolocation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationBackend {
    /// Configured coordinates
    Fixed,
    /// Slowly drifting simulated fix
    #[default]
    Mock,
    /// Local gpsd daemon (JSON protocol over TCP)
    Gpsd,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub backend: GeolocationBackend,

    /// Latitude for the fixed backend / mock start point (degrees)
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Longitude for the fixed backend / mock start point (degrees)
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Reported accuracy (meters)
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,

    /// Acquisition budget (ms)
    #[serde(default = "default_geolocation_timeout_ms")]
    pub timeout_ms: u64,

    /// gpsd address (`host:port`), gpsd backend only
    #[serde(default = "default_gpsd_addr")]
    pub gpsd_addr: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            backend: GeolocationBackend::default(),
            latitude: None,
            longitude: None,
            accuracy: default_accuracy(),
            timeout_ms: default_geolocation_timeout_ms(),
            gpsd_addr: default_gpsd_addr(),
        }
    }
}

fn default_accuracy() -> f64 {
    10.0
}

fn default_geolocation_timeout_ms() -> u64 {
    4000
}

fn default_gpsd_addr() -> String {
    "127.0.0.1:2947".to_string()
}

/// Ambient light backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientLightBackend {
    /// Linux IIO illuminance channel
    Iio,
    #[default]
    Mock,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientLightConfig {
    #[serde(default)]
    pub backend: AmbientLightBackend,

    /// IIO device directory (None = discover)
    #[serde(default)]
    pub device_path: Option<PathBuf>,

    /// Device polling / emission frequency (Hz), must be > 0
    #[serde(default = "default_light_frequency_hz")]
    pub frequency_hz: f64,

    /// Acquisition budget (ms)
    #[serde(default = "default_light_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            backend: AmbientLightBackend::default(),
            device_path: None,
            frequency_hz: default_light_frequency_hz(),
            timeout_ms: default_light_timeout_ms(),
        }
    }
}

fn default_light_frequency_hz() -> f64 {
    5.0
}

fn default_light_timeout_ms() -> u64 {
    1000
}

/// Orientation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationBackend {
    #[default]
    Mock,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationConfig {
    #[serde(default)]
    pub backend: OrientationBackend,

    /// Event frequency (Hz), must be > 0
    #[serde(default = "default_orientation_frequency_hz")]
    pub frequency_hz: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            backend: OrientationBackend::default(),
            frequency_hz: default_orientation_frequency_hz(),
        }
    }
}

fn default_orientation_frequency_hz() -> f64 {
    10.0
}

/// Battery backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryBackend {
    /// `/sys/class/power_supply/BAT*`
    Sysfs,
    #[default]
    Mock,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    #[serde(default)]
    pub backend: BatteryBackend,

    /// Power supply directory (None = discover)
    #[serde(default)]
    pub supply_path: Option<PathBuf>,

    /// Acquisition budget (ms)
    #[serde(default = "default_battery_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            backend: BatteryBackend::default(),
            supply_path: None,
            timeout_ms: default_battery_timeout_ms(),
        }
    }
}

fn default_battery_timeout_ms() -> u64 {
    1000
}

/// Ingest server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Warehouse dataset
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Schema-1 table (also the batch destination)
    #[serde(default = "default_table")]
    pub table: String,

    /// Schema-2 table
    #[serde(default = "default_table_schema2")]
    pub table_schema2: String,

    /// Warehouse sink backend
    #[serde(default)]
    pub sink: SinkKind,

    /// Output directory for the file sink
    #[serde(default = "default_sink_path")]
    pub sink_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dataset: default_dataset(),
            table: default_table(),
            table_schema2: default_table_schema2(),
            sink: SinkKind::default(),
            sink_path: default_sink_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_dataset() -> String {
    "Sensor_Data".to_string()
}

fn default_table() -> String {
    "Sensor_Data_Table".to_string()
}

fn default_table_schema2() -> String {
    "Sensor_Data_Table_schema_2".to_string()
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("./warehouse")
}

/// Warehouse sink backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Log rows via tracing
    #[default]
    Log,
    /// Append rows as NDJSON, one file per table
    File,
    /// Keep rows in process memory
    Memory,
}
