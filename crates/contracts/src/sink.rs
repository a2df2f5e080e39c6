//! WarehouseSink trait - ingest server output interface
//!
//! The warehouse is an opaque sink: rows go in, success or failure comes out.

use crate::ContractError;

/// One warehouse row, column name -> scalar JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Warehouse output trait
///
/// Implementations are shared by every request of the server process, so
/// writes take `&self`.
#[trait_variant::make(WarehouseSink: Send)]
pub trait LocalWarehouseSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Insert rows into `dataset.table` in a single call
    ///
    /// # Errors
    /// Returns write error (should include context, it is logged server-side
    /// and never forwarded to callers)
    async fn insert(&self, dataset: &str, table: &str, rows: Vec<Row>) -> Result<(), ContractError>;
}
