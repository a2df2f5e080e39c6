//! Sample - collector output
//!
//! One immutable bundle of readings captured at a single instant.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sensor capability kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Geolocation,
    AmbientLight,
    Orientation,
    Battery,
}

impl SensorKind {
    /// All kinds in sample field order
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Geolocation,
        SensorKind::AmbientLight,
        SensorKind::Orientation,
        SensorKind::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geolocation => "geolocation",
            Self::AmbientLight => "ambient_light",
            Self::Orientation => "orientation",
            Self::Battery => "battery",
        }
    }

    /// Default acquisition budget for this kind
    ///
    /// Orientation is a non-blocking cell read, so its budget only guards
    /// against a misbehaving implementation.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Geolocation => Duration::from_millis(4000),
            Self::AmbientLight => Duration::from_millis(1000),
            Self::Orientation => Duration::from_millis(100),
            Self::Battery => Duration::from_millis(1000),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geolocation fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Horizontal accuracy (meters)
    pub accuracy: f64,
}

/// Ambient light level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightLevel {
    /// Illuminance (lux), 2 decimal places
    pub illuminance_lux: f64,
}

impl LightLevel {
    /// Build a level rounded to 2 decimal places
    pub fn rounded(lux: f64) -> Self {
        Self {
            illuminance_lux: (lux * 100.0).round() / 100.0,
        }
    }
}

/// Device orientation angles (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Battery status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub charging: bool,

    /// Charge level in [0, 1]
    pub level: f64,
}

/// A live reading from one source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Geolocation(GeoFix),
    AmbientLight(LightLevel),
    Orientation(OrientationAngles),
    Battery(BatteryStatus),
}

impl Reading {
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Geolocation(_) => SensorKind::Geolocation,
            Self::AmbientLight(_) => SensorKind::AmbientLight,
            Self::Orientation(_) => SensorKind::Orientation,
            Self::Battery(_) => SensorKind::Battery,
        }
    }
}

/// A sample field: real data, or a synthetic stand-in tagged with the reason
/// the real reading was unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Field<T> {
    Live { value: T },
    Synthetic { value: T, reason: String },
}

impl<T> Field<T> {
    pub fn live(value: T) -> Self {
        Self::Live { value }
    }

    pub fn synthetic(value: T, reason: impl Into<String>) -> Self {
        Self::Synthetic {
            value,
            reason: reason.into(),
        }
    }

    /// The value, whichever way it was obtained
    pub fn value(&self) -> &T {
        match self {
            Self::Live { value } | Self::Synthetic { value, .. } => value,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic { .. })
    }

    /// Fault text for synthetic fields
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Live { .. } => None,
            Self::Synthetic { reason, .. } => Some(reason),
        }
    }
}

/// Immutable bundle of readings produced once per collection tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch at acquisition start
    pub captured_at: i64,

    /// Persistent collector instance identifier
    pub instance_id: String,

    pub geolocation: Field<GeoFix>,

    pub ambient_light: Field<LightLevel>,

    /// Last known value, may be stale
    pub orientation: Field<OrientationAngles>,

    pub battery: Field<BatteryStatus>,
}

impl Sample {
    /// Kinds whose field carries a synthetic value
    pub fn synthetic_kinds(&self) -> Vec<SensorKind> {
        let flags = [
            (SensorKind::Geolocation, self.geolocation.is_synthetic()),
            (SensorKind::AmbientLight, self.ambient_light.is_synthetic()),
            (SensorKind::Orientation, self.orientation.is_synthetic()),
            (SensorKind::Battery, self.battery.is_synthetic()),
        ];
        flags
            .into_iter()
            .filter_map(|(kind, synthetic)| synthetic.then_some(kind))
            .collect()
    }
}
