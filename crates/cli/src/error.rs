//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `collect` needs somewhere to deliver to
    #[error("No delivery endpoint: set collector.endpoint or pass --endpoint")]
    MissingEndpoint,

    /// Collection session could not be started or torn down
    #[error("Collection failed: {message}")]
    Collection { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn collection(message: impl Into<String>) -> Self {
        Self::Collection {
            message: message.into(),
        }
    }
}
