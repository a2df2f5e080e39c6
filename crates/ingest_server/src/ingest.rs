//! Ingest path shared by `/insert`, `/insert-table2` and `/insert-batch`
//!
//! One function, three modes:
//! - `Schema1`: one object -> one row in `table`
//! - `Schema2`: one object -> one row in `table_schema2`
//! - `Batch`: non-empty array of schema-1 records -> rows in `table`,
//!   validated up front (all or nothing)
//!
//! Receipt time is stamped here, never taken from the body.

use chrono::{SecondsFormat, Utc};
use contracts::{Row, ServerConfig, WarehouseSink};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::{BodyShape, IngestError};
use crate::lazy::LazySink;

/// Fields every batch record must carry (non-null, non-empty)
pub const BATCH_REQUIRED_FIELDS: [&str; 3] = ["unique_id", "frontend_time_stamp", "sensor_record"];

const NOT_AN_OBJECT: &str = "Request body must be a JSON object.";
const NOT_A_BATCH: &str = "Request body must be a non-empty array of records.";
const BATCH_RECORD_INCOMPLETE: &str =
    "Each record must include unique_id, frontend_time_stamp and sensor_record.";

/// Ingest mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Schema1,
    Schema2,
    Batch,
}

impl IngestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema1 => "schema1",
            Self::Schema2 => "schema2",
            Self::Batch => "batch",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Self::Schema1 => "/insert",
            Self::Schema2 => "/insert-table2",
            Self::Batch => "/insert-batch",
        }
    }

    /// Batch answers in JSON, single-row modes in plain text
    pub fn shape(&self) -> BodyShape {
        match self {
            Self::Batch => BodyShape::Json,
            Self::Schema1 | Self::Schema2 => BodyShape::Text,
        }
    }
}

impl std::fmt::Display for IngestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warehouse destination names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub dataset: String,
    pub table: String,
    pub table_schema2: String,
}

impl TableNames {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            dataset: config.dataset.clone(),
            table: config.table.clone(),
            table_schema2: config.table_schema2.clone(),
        }
    }

    pub fn for_mode(&self, mode: IngestMode) -> &str {
        match mode {
            IngestMode::Schema1 | IngestMode::Batch => &self.table,
            IngestMode::Schema2 => &self.table_schema2,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Result of a successful ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestAck {
    pub mode: IngestMode,
    pub table: String,
    pub rows: usize,
    /// Server receipt time, RFC 3339 UTC
    pub received_at: String,
}

/// Current time as RFC 3339 UTC with milliseconds
pub fn receipt_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a request body as JSON, 400 on failure
pub fn parse_body(shape: BodyShape, body: &[u8]) -> Result<Value, IngestError> {
    serde_json::from_slice(body).map_err(|e| match shape {
        BodyShape::Text => IngestError::bad_request(shape, "Request body must be valid JSON."),
        BodyShape::Json => IngestError::bad_request_with(shape, NOT_A_BATCH, e.to_string()),
    })
}

/// Scalar column value: nested objects and arrays become JSON strings,
/// absent fields become null
fn scalar(value: Option<&Value>) -> Value {
    match value {
        Some(nested @ (Value::Object(_) | Value::Array(_))) => Value::String(nested.to_string()),
        Some(value) => value.clone(),
        None => Value::Null,
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn schema1_row(record: &Value, frontend_key: &str, received_at: &str) -> Row {
    let mut row = Row::new();
    row.insert("unique_id".into(), scalar(record.get("unique_id")));
    row.insert("frontend_timestamp".into(), scalar(record.get(frontend_key)));
    row.insert("backend_timestamp".into(), Value::String(received_at.to_string()));
    row.insert("sensor_record".into(), scalar(record.get("sensor_record")));
    row.insert("log_entry".into(), scalar(record.get("log_entry")));
    row
}

fn schema2_row(record: &Value, received_at: &str) -> Row {
    let mut row = Row::new();
    row.insert("unique_id".into(), scalar(record.get("unique_id")));
    row.insert(
        "frontend_time_stamp".into(),
        scalar(record.get("frontend_time_stamp")),
    );
    row.insert(
        "backend_time_stamp".into(),
        Value::String(received_at.to_string()),
    );
    for column in [
        "heart_rate_sensor",
        "battery_level",
        "humidity",
        "pressure",
        "temperature",
        "log_entry",
    ] {
        row.insert(column.into(), scalar(record.get(column)));
    }
    row
}

fn validate_batch(body: &Value) -> Result<&Vec<Value>, IngestError> {
    let shape = BodyShape::Json;
    let records = match body {
        Value::Array(records) if !records.is_empty() => records,
        Value::Array(_) => {
            return Err(IngestError::bad_request_with(
                shape,
                NOT_A_BATCH,
                "received an empty array",
            ))
        }
        _ => {
            return Err(IngestError::bad_request_with(
                shape,
                NOT_A_BATCH,
                "received a non-array body",
            ))
        }
    };

    for (index, record) in records.iter().enumerate() {
        let missing: Vec<&str> = BATCH_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| is_missing(record.get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::bad_request_with(
                shape,
                BATCH_RECORD_INCOMPLETE,
                format!("record {index} is missing {}", missing.join(", ")),
            ));
        }
    }

    Ok(records)
}

/// Build the rows for one request body
pub fn build_rows(mode: IngestMode, body: &Value, received_at: &str) -> Result<Vec<Row>, IngestError> {
    match mode {
        IngestMode::Schema1 | IngestMode::Schema2 if !body.is_object() => {
            Err(IngestError::bad_request(mode.shape(), NOT_AN_OBJECT))
        }
        IngestMode::Schema1 => Ok(vec![schema1_row(body, "frontend_timestamp", received_at)]),
        IngestMode::Schema2 => Ok(vec![schema2_row(body, received_at)]),
        IngestMode::Batch => Ok(validate_batch(body)?
            .iter()
            .map(|record| schema1_row(record, "frontend_time_stamp", received_at))
            .collect()),
    }
}

/// Parse, map and insert one request body
#[instrument(name = "ingest", skip(sink, tables, mode, body), fields(mode = %mode))]
pub async fn ingest<S>(
    sink: &LazySink<S>,
    tables: &TableNames,
    mode: IngestMode,
    body: &[u8],
) -> Result<IngestAck, IngestError>
where
    S: WarehouseSink + Sync,
{
    let shape = mode.shape();
    let received_at = receipt_time();
    let value = parse_body(shape, body)?;
    let rows = build_rows(mode, &value, &received_at)?;
    let row_count = rows.len();
    let table = tables.for_mode(mode);

    let sink = sink.get().await.map_err(|e| {
        error!(error = %e, "warehouse sink initialization failed");
        IngestError::sink_failure(shape, e)
    })?;

    sink.insert(&tables.dataset, table, rows).await.map_err(|e| {
        error!(
            sink = sink.name(),
            dataset = %tables.dataset,
            table,
            rows = row_count,
            error = %e,
            "warehouse insert failed"
        );
        IngestError::sink_failure(shape, e)
    })?;

    observability::record_rows_inserted(table, row_count);
    info!(table, rows = row_count, received_at = %received_at, "rows inserted");

    Ok(IngestAck {
        mode,
        table: table.to_string(),
        rows: row_count,
        received_at,
    })
}
