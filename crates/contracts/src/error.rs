//! Layered error definitions
//!
//! Categorized by source: config / storage / sensor / sink

use thiserror::Error;

use crate::SensorKind;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Storage Errors =====
    /// Local key/value storage could not be read or written
    #[error("storage error at '{path}': {message}")]
    Storage { path: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create storage error
    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

/// Why a single sensor could not produce a live reading.
///
/// Always local to one field of a sample: the assembler substitutes a
/// synthetic value and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorFault {
    /// Capability missing on this platform, denied, or no data yet
    #[error("{kind} unavailable: {reason}")]
    SourceUnavailable { kind: SensorKind, reason: String },

    /// No reading within the source's own budget
    #[error("{kind} timed out after {waited_ms}ms")]
    AcquisitionTimeout { kind: SensorKind, waited_ms: u64 },

    /// Device present but the read itself failed
    #[error("{kind} read failed: {message}")]
    ReadFailed { kind: SensorKind, message: String },
}

impl SensorFault {
    /// Create unavailable fault
    pub fn unavailable(kind: SensorKind, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            kind,
            reason: reason.into(),
        }
    }

    /// Create read failure
    pub fn read_failed(kind: SensorKind, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            kind,
            message: message.into(),
        }
    }

    /// Metric / log label
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "unavailable",
            Self::AcquisitionTimeout { .. } => "timeout",
            Self::ReadFailed { .. } => "read_failed",
        }
    }

    /// Sensor kind the fault belongs to
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::SourceUnavailable { kind, .. }
            | Self::AcquisitionTimeout { kind, .. }
            | Self::ReadFailed { kind, .. } => *kind,
        }
    }
}
