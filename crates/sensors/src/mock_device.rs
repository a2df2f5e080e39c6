//! Mock device implementation
//!
//! Implements `SensorDevice`, generates simulated readings.
//! Used for development and tests on hosts without the real hardware.

use contracts::{
    BatteryStatus, GeoFix, LightLevel, OrientationAngles, Reading, ReadingCallback, SensorDevice,
    SensorKind,
};
use rand::Rng;
use tracing::warn;

use crate::emitter::{emit_period, spawn_emitter, EmitterState};

/// Mock device configuration
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// Emission frequency (Hz)
    pub frequency_hz: f64,
    /// Never emit anything (simulates a sensor that starts but never reports)
    pub silent: bool,
    /// Add random jitter to the emitted values
    pub jitter: bool,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            silent: false,
            jitter: true,
        }
    }
}

/// Mock device
///
/// Generates simulated readings at the configured frequency in a background
/// thread. Readings are sent through the callback, the same way a platform
/// device driver would deliver them.
pub struct MockDevice {
    device_id: String,
    kind: SensorKind,
    config: MockDeviceConfig,
    state: EmitterState,
}

impl MockDevice {
    /// Create new mock device
    pub fn new(device_id: impl Into<String>, kind: SensorKind, config: MockDeviceConfig) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            config,
            state: EmitterState::default(),
        }
    }

    /// Create mock device with default configuration
    pub fn with_defaults(device_id: impl Into<String>, kind: SensorKind) -> Self {
        Self::new(device_id, kind, MockDeviceConfig::default())
    }

    /// Create a device that accepts listeners but never emits
    pub fn silent(device_id: impl Into<String>, kind: SensorKind) -> Self {
        Self::new(
            device_id,
            kind,
            MockDeviceConfig {
                silent: true,
                ..Default::default()
            },
        )
    }

    /// Generate simulated reading for the given tick
    fn generate_reading(kind: SensorKind, tick: u64, jitter: bool) -> Reading {
        let noise = if jitter {
            rand::rng().random_range(-1.0..1.0)
        } else {
            0.0
        };
        let t = tick as f64;

        match kind {
            SensorKind::Geolocation => Reading::Geolocation(GeoFix {
                latitude: 40.0 + t * 0.0001,
                longitude: -74.0 + t * 0.0001,
                accuracy: 15.0 + noise,
            }),
            SensorKind::AmbientLight => Reading::AmbientLight(LightLevel {
                illuminance_lux: (320.0 + 180.0 * (t * 0.05).sin() + noise * 5.0).max(0.0),
            }),
            SensorKind::Orientation => Reading::Orientation(OrientationAngles {
                alpha: (t * 3.0) % 360.0,
                beta: 10.0 * (t * 0.1).sin() + noise,
                gamma: 5.0 * (t * 0.1).cos() + noise,
            }),
            SensorKind::Battery => Reading::Battery(BatteryStatus {
                charging: false,
                level: (0.9 - t * 0.0001).clamp(0.0, 1.0),
            }),
        }
    }
}

impl SensorDevice for MockDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn listen(&self, callback: ReadingCallback) {
        let Some(interval) = emit_period(self.config.frequency_hz) else {
            warn!(
                device_id = %self.device_id,
                frequency_hz = self.config.frequency_hz,
                "unusable frequency, device stays silent"
            );
            return;
        };

        // Idempotent: if already listening, don't start again
        let Some(generation) = self.state.begin() else {
            return;
        };

        let kind = self.kind;
        let silent = self.config.silent;
        let jitter = self.config.jitter;

        spawn_emitter(
            self.device_id.clone(),
            interval,
            self.state.clone(),
            generation,
            move |tick| (!silent).then(|| Self::generate_reading(kind, tick, jitter)),
            callback,
        );
    }

    fn stop(&self) {
        self.state.end();
    }

    fn is_listening(&self) -> bool {
        self.state.is_listening()
    }
}
