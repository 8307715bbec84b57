//! Error taxonomy for the scheduling core.
//!
//! Every failure here is treated as transient by callers: reconciliation and
//! lifecycle sync log and return, and the next trigger retries from the
//! store, which stays authoritative throughout.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures raised by the OS-level notification scheduler.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// `schedule_at` requires a strictly future fire time.
    #[error("fire time {0} is not in the future")]
    PastTimestamp(DateTime<Utc>),

    /// The OS denied the request (typically missing notification permission).
    #[error("notification permission denied")]
    Denied,

    #[error("device scheduler failure: {0}")]
    Failed(String),
}

/// Top-level error for reconciliation and lifecycle sync entry points.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A remote-store read or write failed (network/service error).
    #[error("store operation failed: {0}")]
    Store(#[source] anyhow::Error),

    #[error("device notification error: {0}")]
    Device(#[from] DeviceError),
}

/// Result type for scheduling operations.
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
