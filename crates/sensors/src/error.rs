//! Sensors error types

use std::path::PathBuf;

use contracts::{ContractError, SensorKind};
use thiserror::Error;

/// Sensor construction error
///
/// Only raised while building sources; acquisition failures are
/// `SensorFault`s and never surface here.
#[derive(Debug, Error)]
pub enum SensorsError {
    /// Explicitly configured device path does not exist
    #[error("{kind} device not found at '{}'", path.display())]
    DeviceNotFound { kind: SensorKind, path: PathBuf },

    /// Backend settings are inconsistent
    #[error("invalid {kind} backend settings: {message}")]
    InvalidBackend { kind: SensorKind, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SensorsError {
    /// Create device-not-found error
    pub fn device_not_found(kind: SensorKind, path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound {
            kind,
            path: path.into(),
        }
    }

    /// Create invalid backend error
    pub fn invalid_backend(kind: SensorKind, message: impl Into<String>) -> Self {
        Self::InvalidBackend {
            kind,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SensorsError>;
