//! HTTP routes
//!
//! | route              | body                        | success                          |
//! |--------------------|-----------------------------|----------------------------------|
//! | `GET /`            | -                           | `Server Is Running`              |
//! | `/api/sensor-data` | sample (camelCase)          | `{status:"success", receivedAt}` |
//! | `/submit-sensor`   | `{battery, location}`       | `{status:"OK", received}`        |
//! | `/insert`          | schema-1 record             | `Row inserted successfully`      |
//! | `/insert-table2`   | schema-2 record             | `Row inserted successfully`      |
//! | `/insert-batch`    | array of schema-1 records   | `{message, receivedAt}`          |

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use contracts::{ServerConfig, WarehouseSink};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::{BodyShape, IngestError};
use crate::ingest::{ingest, parse_body, IngestMode, TableNames};
use crate::lazy::LazySink;
use crate::sinks::Warehouse;

/// Response header carrying the receipt time of single-row inserts
pub const RECEIVED_AT_HEADER: &str = "x-received-at";

/// Shared server state
pub struct AppState<S> {
    sink: Arc<LazySink<S>>,
    tables: Arc<TableNames>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            tables: Arc::clone(&self.tables),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(sink: LazySink<S>, tables: TableNames) -> Self {
        Self {
            sink: Arc::new(sink),
            tables: Arc::new(tables),
        }
    }

    pub fn sink(&self) -> &LazySink<S> {
        &self.sink
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }
}

impl AppState<Warehouse> {
    /// State with the configured warehouse, created on the first insert
    pub fn from_config(config: &ServerConfig) -> Self {
        let sink_config = config.clone();
        Self::new(
            LazySink::new(move || Warehouse::from_config(&sink_config)),
            TableNames::from_config(config),
        )
    }
}

/// Build the router with permissive CORS
pub fn router<S>(state: AppState<S>) -> Router
where
    S: WarehouseSink + Sync + 'static,
{
    Router::new()
        .route("/", get(health))
        .route("/api/sensor-data", post(sensor_data))
        .route("/submit-sensor", post(submit_sensor))
        .route("/insert", post(insert::<S>))
        .route("/insert-table2", post(insert_table2::<S>))
        .route("/insert-batch", post(insert_batch::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn finish(route: &str, response: Response) -> Response {
    observability::record_ingest(route, response.status().as_u16());
    response
}

async fn health() -> &'static str {
    "Server Is Running"
}

async fn sensor_data(body: Bytes) -> Response {
    let response = match parse_body(BodyShape::Text, &body) {
        Ok(payload) => {
            let received = Utc::now();
            let received_at = received.to_rfc3339_opts(SecondsFormat::Millis, true);

            match payload.get("timestamp").and_then(Value::as_f64) {
                Some(captured_ms) => {
                    // 两端时钟独立，延迟可能为负
                    let latency_ms = received.timestamp_millis() as f64 - captured_ms;
                    observability::record_transit_latency_ms(latency_ms);
                    info!(latency_ms, payload = %payload, "sensor data received");
                }
                None => info!(payload = %payload, "sensor data received without timestamp"),
            }

            Json(json!({ "status": "success", "receivedAt": received_at })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "sensor data rejected");
            e.into_response()
        }
    };
    finish("/api/sensor-data", response)
}

async fn submit_sensor(body: Bytes) -> Response {
    let response = match parse_body(BodyShape::Text, &body) {
        Ok(payload) => {
            let (battery, location) = submission_parts(&payload);
            info!(
                battery = %battery,
                location = %location,
                "sensor submission received"
            );
            Json(json!({ "status": "OK", "received": payload })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "sensor submission rejected");
            e.into_response()
        }
    };
    finish("/submit-sensor", response)
}

/// battery / location of a submission, null when absent
fn submission_parts(payload: &Value) -> (&Value, &Value) {
    (&payload["battery"], &payload["location"])
}

async fn insert<S>(State(state): State<AppState<S>>, body: Bytes) -> Response
where
    S: WarehouseSink + Sync + 'static,
{
    ingest_route(&state, IngestMode::Schema1, &body).await
}

async fn insert_table2<S>(State(state): State<AppState<S>>, body: Bytes) -> Response
where
    S: WarehouseSink + Sync + 'static,
{
    ingest_route(&state, IngestMode::Schema2, &body).await
}

async fn insert_batch<S>(State(state): State<AppState<S>>, body: Bytes) -> Response
where
    S: WarehouseSink + Sync + 'static,
{
    ingest_route(&state, IngestMode::Batch, &body).await
}

async fn ingest_route<S>(state: &AppState<S>, mode: IngestMode, body: &[u8]) -> Response
where
    S: WarehouseSink + Sync + 'static,
{
    let response = match ingest(state.sink(), state.tables(), mode, body).await {
        Ok(ack) if mode == IngestMode::Batch => Json(json!({
            "message": format!("{} rows inserted successfully into {}", ack.rows, ack.table),
            "receivedAt": ack.received_at,
        }))
        .into_response(),
        Ok(ack) => (
            [(RECEIVED_AT_HEADER, ack.received_at)],
            "Row inserted successfully",
        )
            .into_response(),
        Err(e) => {
            if let IngestError::BadRequest { message, details, .. } = &e {
                warn!(mode = %mode, message = %message, details = ?details, "ingest rejected");
            }
            e.into_response()
        }
    };
    finish(mode.route(), response)
}
