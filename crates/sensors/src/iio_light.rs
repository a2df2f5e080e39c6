//! Linux IIO illuminance device
//!
//! Polls `in_illuminance_input` (already in lux) or
//! `in_illuminance_raw * in_illuminance_scale` from an IIO device directory
//! in a background thread.

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{LightLevel, Reading, ReadingCallback, SensorDevice, SensorKind};
use tracing::warn;

use crate::emitter::{emit_period, spawn_emitter, EmitterState};

/// Default IIO device root
pub const IIO_DEVICES_ROOT: &str = "/sys/bus/iio/devices";

const INPUT_FILE: &str = "in_illuminance_input";
const RAW_FILE: &str = "in_illuminance_raw";
const SCALE_FILE: &str = "in_illuminance_scale";

/// IIO light sensor device
pub struct IioLightDevice {
    device_id: String,
    path: PathBuf,
    frequency_hz: f64,
    state: EmitterState,
}

impl IioLightDevice {
    /// Create device for an IIO device directory
    pub fn new(path: impl Into<PathBuf>, frequency_hz: f64) -> Self {
        let path = path.into();
        let device_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "iio".to_string());

        Self {
            device_id,
            path,
            frequency_hz,
            state: EmitterState::default(),
        }
    }

    /// Whether `path` exposes an illuminance channel
    pub fn has_illuminance_channel(path: &Path) -> bool {
        path.join(INPUT_FILE).is_file() || path.join(RAW_FILE).is_file()
    }

    /// Find the first IIO device under `root` with an illuminance channel
    pub fn discover(root: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(root)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| Self::has_illuminance_channel(path))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    /// Read the current illuminance in lux
    pub fn read_lux(path: &Path) -> std::io::Result<f64> {
        let input = path.join(INPUT_FILE);
        if input.is_file() {
            return read_number(&input);
        }

        let raw = read_number(&path.join(RAW_FILE))?;
        let scale = match read_number(&path.join(SCALE_FILE)) {
            Ok(scale) => scale,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1.0,
            Err(e) => return Err(e),
        };
        Ok(raw * scale)
    }
}

fn read_number(path: &Path) -> std::io::Result<f64> {
    let text = fs::read_to_string(path)?;
    text.trim().parse::<f64>().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {e}", path.display()),
        )
    })
}

impl SensorDevice for IioLightDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn kind(&self) -> SensorKind {
        SensorKind::AmbientLight
    }

    fn listen(&self, callback: ReadingCallback) {
        let Some(interval) = emit_period(self.frequency_hz) else {
            warn!(
                device_id = %self.device_id,
                frequency_hz = self.frequency_hz,
                "unusable polling frequency, device not started"
            );
            return;
        };

        let Some(generation) = self.state.begin() else {
            return;
        };

        let path = self.path.clone();
        let device_id = self.device_id.clone();

        spawn_emitter(
            self.device_id.clone(),
            interval,
            self.state.clone(),
            generation,
            move |_| match Self::read_lux(&path) {
                Ok(lux) => Some(Reading::AmbientLight(LightLevel {
                    illuminance_lux: lux,
                })),
                Err(e) => {
                    warn!(device_id = %device_id, error = %e, "illuminance read failed");
                    None
                }
            },
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
