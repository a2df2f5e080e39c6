//! FileWarehouse - appends rows to NDJSON files, one per table
//!
//! Layout: `{base_path}/{dataset}/{table}.ndjson`

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use contracts::{ContractError, Row, WarehouseSink};
use tracing::{debug, error, instrument};

/// Warehouse backed by local NDJSON files
#[derive(Debug)]
pub struct FileWarehouse {
    name: String,
    base_path: PathBuf,
    /// Serializes appends; also remembers created dataset dirs
    created_dirs: Mutex<HashSet<PathBuf>>,
}

impl FileWarehouse {
    /// Create a new FileWarehouse, creating `base_path` if needed
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            name: name.into(),
            base_path,
            created_dirs: Mutex::new(HashSet::new()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File that holds the rows of `dataset.table`
    pub fn table_path(&self, dataset: &str, table: &str) -> PathBuf {
        self.base_path.join(dataset).join(format!("{table}.ndjson"))
    }

    fn append_rows(&self, dataset: &str, table: &str, rows: &[Row]) -> std::io::Result<()> {
        let mut created = self
            .created_dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let dataset_dir = self.base_path.join(dataset);
        if !created.contains(&dataset_dir) {
            fs::create_dir_all(&dataset_dir)?;
            created.insert(dataset_dir);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.table_path(dataset, table))?;
        let mut writer = BufWriter::new(file);
        for row in rows {
            serde_json::to_writer(&mut writer, row)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    fn persist_rows(&self, dataset: &str, table: &str, rows: &[Row]) -> Result<(), ContractError> {
        self.append_rows(dataset, table, rows).map_err(|e| {
            error!(sink = %self.name, dataset, table, error = %e, "append failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl WarehouseSink for FileWarehouse {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_warehouse_insert",
        skip(self, rows),
        fields(sink = %self.name, rows = rows.len())
    )]
    async fn insert(&self, dataset: &str, table: &str, rows: Vec<Row>) -> Result<(), ContractError> {
        self.persist_rows(dataset, table, &rows)?;
        debug!(sink = %self.name, "rows appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn row(id: &str) -> Row {
        let mut row = Row::new();
        row.insert("unique_id".into(), json!(id));
        row.insert("sensor_record".into(), json!("{\"lat\":1}"));
        row
    }

    #[tokio::test]
    async fn test_file_warehouse_appends_ndjson() {
        let dir = tempdir().unwrap();
        let sink = FileWarehouse::new("test_file", dir.path().join("warehouse")).unwrap();

        sink.insert("Sensor_Data", "Sensor_Data_Table", vec![row("a")])
            .await
            .unwrap();
        sink.insert("Sensor_Data", "Sensor_Data_Table", vec![row("b"), row("c")])
            .await
            .unwrap();

        let path = sink.table_path("Sensor_Data", "Sensor_Data_Table");
        let content = fs::read_to_string(path).unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                value["unique_id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_file_warehouse_write_error() {
        let dir = tempdir().unwrap();
        let sink = FileWarehouse::new("test_file", dir.path()).unwrap();
        // 数据集目录位置被普通文件占用
        fs::write(dir.path().join("blocked"), b"").unwrap();

        let err = sink
            .insert("blocked", "Sensor_Data_Table", vec![row("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }
}
