//! Ingest server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::ContractError;
use serde_json::json;
use thiserror::Error;

/// Message returned to callers for every sink failure
pub const OPAQUE_FAILURE: &str = "An error occurred while processing your request.";

/// How an error body is rendered for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Plain text body
    Text,
    /// `{error, details}` JSON body
    Json,
}

/// Request-level errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Body failed a presence or shape check (400)
    #[error("bad request: {message}")]
    BadRequest {
        shape: BodyShape,
        message: String,
        details: Option<String>,
    },

    /// Sink could not be initialized or rejected the insert (500)
    ///
    /// The source is logged server-side only.
    #[error("sink failure: {source}")]
    SinkFailure {
        shape: BodyShape,
        #[source]
        source: ContractError,
    },
}

impl IngestError {
    pub fn bad_request(shape: BodyShape, message: impl Into<String>) -> Self {
        Self::BadRequest {
            shape,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request_with(
        shape: BodyShape,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::BadRequest {
            shape,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn sink_failure(shape: BodyShape, source: ContractError) -> Self {
        Self::SinkFailure { shape, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::SinkFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::BadRequest {
                shape: BodyShape::Text,
                message,
                ..
            } => (status, message).into_response(),
            Self::BadRequest {
                shape: BodyShape::Json,
                message,
                details,
            } => {
                let body = match details {
                    Some(details) => json!({ "error": message, "details": details }),
                    None => json!({ "error": message }),
                };
                (status, Json(body)).into_response()
            }
            Self::SinkFailure {
                shape: BodyShape::Text,
                ..
            } => (status, OPAQUE_FAILURE).into_response(),
            Self::SinkFailure {
                shape: BodyShape::Json,
                ..
            } => (
                status,
                Json(json!({
                    "error": OPAQUE_FAILURE,
                    "details": "the rows were not stored",
                })),
            )
                .into_response(),
        }
    }
}

/// Errors that stop the server itself
#[derive(Debug, Error)]
pub enum ServeError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accept loop failed
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
