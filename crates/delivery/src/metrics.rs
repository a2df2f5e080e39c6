//! Delivery metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DeliveryOutcome;

/// Counters for one delivery client
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Total attempts
    attempts: AtomicU64,
    /// 2xx responses
    delivered: AtomicU64,
    /// Non-2xx responses
    rejected: AtomicU64,
    /// Attempts with no response
    network_failures: AtomicU64,
    /// Status of the most recent response (0 = none yet)
    last_status: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified attempt
    pub fn record(&self, outcome: &DeliveryOutcome) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match outcome {
            DeliveryOutcome::Delivered { .. } => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
            DeliveryOutcome::Rejected { status, .. } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                self.last_status.store(u64::from(*status), Ordering::Relaxed);
            }
            DeliveryOutcome::NetworkFailure { .. } => {
                self.network_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Remember the status of a successful response
    pub fn set_last_status(&self, status: u16) {
        self.last_status.store(u64::from(status), Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn network_failures(&self) -> u64 {
        self.network_failures.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_status = self.last_status.load(Ordering::Relaxed);
        MetricsSnapshot {
            attempts: self.attempts(),
            delivered: self.delivered(),
            rejected: self.rejected(),
            network_failures: self.network_failures(),
            last_status: (last_status != 0).then_some(last_status as u16),
        }
    }
}

/// Snapshot of delivery metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub network_failures: u64,
    pub last_status: Option<u16>,
}
