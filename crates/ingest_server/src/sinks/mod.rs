//! Warehouse sink implementations
//!
//! Contains LogWarehouse, FileWarehouse and MemoryWarehouse, plus the
//! config-selected `Warehouse` used by the server binary.

mod file;
mod log;
mod memory;

use contracts::{ContractError, Row, ServerConfig, SinkKind, WarehouseSink};

pub use self::file::FileWarehouse;
pub use self::log::LogWarehouse;
pub use self::memory::MemoryWarehouse;

/// Sink selected by `ServerConfig::sink`
#[derive(Debug)]
pub enum Warehouse {
    Log(LogWarehouse),
    File(FileWarehouse),
    Memory(MemoryWarehouse),
}

impl Warehouse {
    /// Create the configured sink
    ///
    /// # Errors
    /// File sink whose output directory cannot be created
    pub fn from_config(config: &ServerConfig) -> Result<Self, ContractError> {
        match config.sink {
            SinkKind::Log => Ok(Self::Log(LogWarehouse::new("log"))),
            SinkKind::File => FileWarehouse::new("file", config.sink_path.clone())
                .map(Self::File)
                .map_err(|e| ContractError::SinkConnection {
                    sink_name: "file".to_string(),
                    message: format!("{}: {e}", config.sink_path.display()),
                }),
            SinkKind::Memory => Ok(Self::Memory(MemoryWarehouse::new("memory"))),
        }
    }
}

impl WarehouseSink for Warehouse {
    fn name(&self) -> &str {
        match self {
            Self::Log(sink) => sink.name(),
            Self::File(sink) => sink.name(),
            Self::Memory(sink) => sink.name(),
        }
    }

    async fn insert(&self, dataset: &str, table: &str, rows: Vec<Row>) -> Result<(), ContractError> {
        match self {
            Self::Log(sink) => sink.insert(dataset, table, rows).await,
            Self::File(sink) => sink.insert(dataset, table, rows).await,
            Self::Memory(sink) => sink.insert(dataset, table, rows).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_config() {
        let dir = tempdir().unwrap();
        let mut config = ServerConfig::default();
        assert!(matches!(Warehouse::from_config(&config), Ok(Warehouse::Log(_))));

        config.sink = SinkKind::File;
        config.sink_path = dir.path().join("out");
        let sink = Warehouse::from_config(&config).unwrap();
        assert_eq!(sink.name(), "file");
        assert!(dir.path().join("out").is_dir());

        config.sink = SinkKind::Memory;
        assert!(matches!(Warehouse::from_config(&config), Ok(Warehouse::Memory(_))));
    }

    #[test]
    fn test_file_sink_connection_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();

        let config = ServerConfig {
            sink: SinkKind::File,
            sink_path: blocker.join("out"),
            ..ServerConfig::default()
        };
        assert!(matches!(
            Warehouse::from_config(&config),
            Err(ContractError::SinkConnection { .. })
        ));
    }
}
