//! Collector error types

use thiserror::Error;

use contracts::ContractError;

/// Collection session error
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Session parameters rejected at start
    #[error("invalid collection config: {message}")]
    InvalidConfig { message: String },

    /// Parameter change attempted while the session is running
    #[error("cannot change {field} while collection is running")]
    SessionRunning { field: &'static str },

    /// Instance id storage could not be read or written
    #[error(transparent)]
    Storage(#[from] ContractError),
}

impl CollectorError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CollectorError>;
