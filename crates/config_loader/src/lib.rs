//! # Config Loader
//!
//! Builds the effective `RelayConfig`:
//!
//! 1. parse the TOML/JSON file, rejecting settings the relay does not know
//! 2. resolve relative paths written in the file against its directory
//! 3. apply `TELEMETRY_RELAY_*` environment overrides
//! 4. validate
//!
//! Command line flags are applied by the CLI on top, followed by another
//! `ConfigLoader::validate`.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("relay.toml"))?;
//! println!("Interval: {}ms", config.collector.interval_ms);
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod overrides;
mod parser;
mod validator;

pub use contracts::RelayConfig;
pub use overrides::{ENV_PREFIX, ENV_SETTINGS};
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::info;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a file (format from its extension) with the process environment applied
    pub fn load_from_path(path: &Path) -> Result<RelayConfig, ContractError> {
        Self::load_from_path_with_env(path, overrides::process_env())
    }

    /// Load a file with an explicit set of environment variables
    pub fn load_from_path_with_env<I>(path: &Path, vars: I) -> Result<RelayConfig, ContractError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let format = ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "unsupported config format '{}': expected .toml or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        let mut doc = parser::parse(&content, format)?;
        if let Some(dir) = path.parent() {
            overrides::resolve_paths(&mut doc, dir);
        }

        Self::finish(doc.config, vars)
    }

    /// Defaults with the process environment applied, for runs without a file
    pub fn load_defaults() -> Result<RelayConfig, ContractError> {
        Self::finish(RelayConfig::default(), overrides::process_env())
    }

    /// Parse and validate a document as-is (no environment, no path resolution)
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RelayConfig, ContractError> {
        let config = parser::parse(content, format)?.config;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    pub fn to_toml(config: &RelayConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &RelayConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn finish<I>(mut config: RelayConfig, vars: I) -> Result<RelayConfig, ContractError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let applied = overrides::apply_env(&mut config, vars)?;
        if !applied.is_empty() {
            info!(settings = ?applied, "Applied environment overrides");
        }
        validator::validate(&config)?;
        Ok(config)
    }
}
