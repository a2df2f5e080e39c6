//! MemoryWarehouse - keeps rows in process memory

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, Row, WarehouseSink};
use tracing::debug;

/// In-process warehouse, clones share the same tables
#[derive(Debug, Clone)]
pub struct MemoryWarehouse {
    name: String,
    tables: Arc<Mutex<BTreeMap<String, Vec<Row>>>>,
}

impl MemoryWarehouse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Row>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rows stored in `table` (any dataset), in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().get(table).cloned().unwrap_or_default()
    }

    pub fn total_rows(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }
}

impl WarehouseSink for MemoryWarehouse {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, dataset: &str, table: &str, rows: Vec<Row>) -> Result<(), ContractError> {
        debug!(sink = %self.name, dataset, table, rows = rows.len(), "rows stored");
        self.lock().entry(table.to_string()).or_default().extend(rows);
        Ok(())
    }
}
