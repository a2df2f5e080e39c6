//! LogWarehouse - logs inserted rows via tracing

use contracts::{ContractError, Row, WarehouseSink};
use tracing::{debug, info, instrument};

/// Warehouse that only logs what it receives
#[derive(Debug, Clone)]
pub struct LogWarehouse {
    name: String,
}

impl LogWarehouse {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_rows(&self, dataset: &str, table: &str, rows: &[Row]) {
        info!(
            sink = %self.name,
            dataset,
            table,
            rows = rows.len(),
            "rows received"
        );
        for row in rows {
            debug!(sink = %self.name, table, row = %serde_json::Value::Object(row.clone()), "row");
        }
    }
}

impl WarehouseSink for LogWarehouse {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_warehouse_insert",
        skip(self, rows),
        fields(sink = %self.name, rows = rows.len())
    )]
    async fn insert(&self, dataset: &str, table: &str, rows: Vec<Row>) -> Result<(), ContractError> {
        self.log_rows(dataset, table, &rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_warehouse_insert() {
        let sink = LogWarehouse::new("test_log");
        let mut row = Row::new();
        row.insert("unique_id".into(), json!("abc"));

        let result = sink.insert("Sensor_Data", "Sensor_Data_Table", vec![row]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_warehouse_name() {
        let sink = LogWarehouse::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
