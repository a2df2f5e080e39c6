//! SampleTransport trait - collector output interface
//!
//! Delivery is at-most-once: one request per sample, no retry, and the
//! outcome is classified into exactly one `DeliveryOutcome` variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Sample;

/// Classified result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// 2xx response, `ack` is the response body
    Delivered { ack: String },

    /// Non-2xx response
    Rejected { status: u16, reason: String },

    /// No response (connect, DNS, IO, body encoding)
    NetworkFailure { reason: String },
}

impl DeliveryOutcome {
    /// Metric / log label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Rejected { .. } => "rejected",
            Self::NetworkFailure { .. } => "network_failure",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Convert into a result, failures become `DeliveryError`
    pub fn into_result(self) -> Result<String, DeliveryError> {
        match self {
            Self::Delivered { ack } => Ok(ack),
            Self::Rejected { status, reason } => Err(DeliveryError::Rejected { status, reason }),
            Self::NetworkFailure { reason } => Err(DeliveryError::Network { reason }),
        }
    }
}

/// Delivery failure, surfaced to the display as a transient notice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("network failure: {reason}")]
    Network { reason: String },
}

/// Sample transport trait
///
/// All delivery clients implement this trait.
#[trait_variant::make(SampleTransport: Send)]
pub trait LocalSampleTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one sample to `endpoint` and classify the result
    async fn deliver(&self, sample: &Sample, endpoint: &str) -> DeliveryOutcome;
}
