//! Persistent collector instance id
//!
//! Stored in a small JSON key/value file so that every sample from the same
//! installation carries the same id across restarts.

use std::fs;
use std::path::{Path, PathBuf};

use contracts::ContractError;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

/// Storage key for the instance id
pub const INSTANCE_ID_KEY: &str = "browserInstanceId";

/// JSON key/value file holding the instance id
#[derive(Debug, Clone)]
pub struct InstanceIdStore {
    path: PathBuf,
}

impl InstanceIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the stored id, creating and persisting a new one if absent
    ///
    /// Other keys in the file are preserved. An unreadable or non-object
    /// file is an error rather than being overwritten.
    pub fn load_or_create(&self) -> Result<String, ContractError> {
        let mut entries = self.read_entries()?;

        if let Some(Value::String(id)) = entries.get(INSTANCE_ID_KEY) {
            if !id.is_empty() {
                debug!(instance_id = %id, "instance id loaded");
                return Ok(id.clone());
            }
        }

        let id = Uuid::new_v4().to_string();
        entries.insert(INSTANCE_ID_KEY.to_string(), Value::String(id.clone()));
        self.write_entries(&entries)?;

        info!(instance_id = %id, path = %self.path.display(), "new instance id created");
        Ok(id)
    }

    fn read_entries(&self) -> Result<Map<String, Value>, ContractError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.storage_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content).map_err(|e| self.storage_error(e))? {
            Value::Object(entries) => Ok(entries),
            _ => Err(self.storage_error("storage file is not a JSON object")),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), ContractError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| self.storage_error(e))?;
        fs::write(&self.path, json).map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, message: impl ToString) -> ContractError {
        ContractError::storage(self.path.display().to_string(), message.to_string())
    }
}
