//! Transient notices
//!
//! Delivery results are shown for a limited time and then dismissed
//! automatically. Expiry uses the tokio clock.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::DeliveryOutcome;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// One user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            message: message.into(),
        }
    }

    /// Notice describing a delivery attempt
    pub fn from_outcome(outcome: &DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Delivered { .. } => Self::success("Data sent successfully"),
            DeliveryOutcome::Rejected { status, reason } => {
                Self::failure(format!("Failed to send data: {status} {reason}"))
            }
            DeliveryOutcome::NetworkFailure { reason } => {
                Self::failure(format!("Error sending data: {reason}"))
            }
        }
    }
}

/// Visibility per notice level
#[derive(Debug, Clone, Copy)]
pub struct NoticeTtl {
    pub success: Duration,
    pub failure: Duration,
}

impl Default for NoticeTtl {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(3000),
            failure: Duration::from_millis(5000),
        }
    }
}

impl NoticeTtl {
    pub fn for_level(&self, level: NoticeLevel) -> Duration {
        match level {
            NoticeLevel::Success => self.success,
            NoticeLevel::Failure => self.failure,
        }
    }
}

/// Currently visible notices
#[derive(Debug, Default)]
pub struct NoticeBoard {
    ttl: NoticeTtl,
    entries: Mutex<Vec<(Instant, Notice)>>,
}

impl NoticeBoard {
    pub fn new(ttl: NoticeTtl) -> Self {
        Self {
            ttl,
            entries: Mutex::default(),
        }
    }

    /// Show a notice until its level's ttl elapses
    pub fn post(&self, notice: Notice) {
        let expires_at = Instant::now() + self.ttl.for_level(notice.level);
        self.lock().push((expires_at, notice));
    }

    /// Notices still visible, oldest first; expired ones are dropped
    pub fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|(expires_at, _)| *expires_at > now);
        entries.iter().map(|(_, notice)| notice.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Instant, Notice)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
