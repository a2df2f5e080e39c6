//! Wire encodings
//!
//! - `sensor_data`: camelCase body for `/api/sensor-data`
//! - `schema1`: warehouse row for `/insert`, readings packed into a
//!   JSON-encoded `sensor_record` string
//! - `submit_sensor`: battery + location for `/submit-sensor`, synthetic
//!   readings sent as `null`

use chrono::{DateTime, SecondsFormat};
use contracts::{
    BatteryStatus, Field, GeoFix, LightLevel, OrientationAngles, Sample, WireFormat,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geolocation as sent on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientLightPayload {
    pub illuminance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationPayload {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryPayload {
    pub charging: bool,
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The nested readings of a sample
///
/// `error` carries the fault text of synthetic fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    pub geolocation: GeolocationPayload,
    pub ambient_light: AmbientLightPayload,
    pub orientation: OrientationPayload,
    pub battery: BatteryPayload,
}

impl SensorRecord {
    pub fn from_sample(sample: &Sample) -> Self {
        let error = |reason: Option<&str>| reason.map(str::to_string);

        let geo: &GeoFix = sample.geolocation.value();
        let light: &LightLevel = sample.ambient_light.value();
        let angles: &OrientationAngles = sample.orientation.value();
        let battery: &BatteryStatus = sample.battery.value();

        Self {
            geolocation: GeolocationPayload {
                latitude: geo.latitude,
                longitude: geo.longitude,
                accuracy: geo.accuracy,
                error: error(sample.geolocation.reason()),
            },
            ambient_light: AmbientLightPayload {
                illuminance: light.illuminance_lux,
                error: error(sample.ambient_light.reason()),
            },
            orientation: OrientationPayload {
                alpha: angles.alpha,
                beta: angles.beta,
                gamma: angles.gamma,
                error: error(sample.orientation.reason()),
            },
            battery: BatteryPayload {
                charging: battery.charging,
                level: battery.level,
                error: error(sample.battery.reason()),
            },
        }
    }
}

/// `/api/sensor-data` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDataBody {
    /// Capture time, ms since the Unix epoch
    pub timestamp: i64,
    pub browser_instance_id: String,
    #[serde(flatten)]
    pub record: SensorRecord,
}

/// `/insert` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema1Body {
    pub unique_id: String,
    pub frontend_timestamp: String,
    /// JSON-encoded `SensorRecord`
    pub sensor_record: String,
    pub log_entry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryBrief {
    pub charging: bool,
    pub level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationBrief {
    pub latitude: f64,
    pub longitude: f64,
}

/// `/submit-sensor` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSensorBody {
    pub battery: Option<BatteryBrief>,
    pub location: Option<LocationBrief>,
}

fn live<T: Copy>(field: &Field<T>) -> Option<T> {
    match field {
        Field::Live { value } => Some(*value),
        Field::Synthetic { .. } => None,
    }
}

/// RFC 3339 (UTC, milliseconds) for an epoch-millisecond timestamp
pub fn rfc3339_millis(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn log_entry(sample: &Sample) -> String {
    let synthetic = sample.synthetic_kinds();
    if synthetic.is_empty() {
        return "all readings live".to_string();
    }
    let kinds: Vec<&str> = synthetic.iter().map(|kind| kind.as_str()).collect();
    format!("synthetic fallback: {}", kinds.join(", "))
}

/// Encode a sample as a request body
pub fn encode(sample: &Sample, format: WireFormat) -> Result<Value, serde_json::Error> {
    match format {
        WireFormat::SensorData => serde_json::to_value(SensorDataBody {
            timestamp: sample.captured_at,
            browser_instance_id: sample.instance_id.clone(),
            record: SensorRecord::from_sample(sample),
        }),
        WireFormat::Schema1 => serde_json::to_value(Schema1Body {
            unique_id: sample.instance_id.clone(),
            frontend_timestamp: rfc3339_millis(sample.captured_at),
            sensor_record: serde_json::to_string(&SensorRecord::from_sample(sample))?,
            log_entry: log_entry(sample),
        }),
        WireFormat::SubmitSensor => serde_json::to_value(SubmitSensorBody {
            battery: live(&sample.battery).map(|b| BatteryBrief {
                charging: b.charging,
                level: b.level,
            }),
            location: live(&sample.geolocation).map(|g| LocationBrief {
                latitude: g.latitude,
                longitude: g.longitude,
            }),
        }),
    }
}

/// Recover the nested readings from a schema-1 `sensor_record` string
pub fn decode_sensor_record(encoded: &str) -> Result<SensorRecord, serde_json::Error> {
    serde_json::from_str(encoded)
}
