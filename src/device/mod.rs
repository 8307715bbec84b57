//! Device notification adapter seam.
//!
//! The OS notification scheduler is a black box behind [`NotificationScheduler`];
//! the platform shell supplies the real implementation, [`memory::MemoryScheduler`]
//! backs tests and host-side harnesses. Handles returned here are owned by
//! this layer and cached in the [`handle_map::HandleMap`], never persisted to
//! the remote store.

pub mod handle_map;
pub mod memory;

use crate::error::DeviceError;
use crate::types::{Handle, NotificationContent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One-shot local notification scheduling as exposed by the OS.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Arm a one-shot notification. Fails with [`DeviceError::PastTimestamp`]
    /// unless `fire_at` is strictly in the future; checking first is the
    /// caller's job.
    async fn schedule_at(
        &self,
        content: &NotificationContent,
        fire_at: DateTime<Utc>,
    ) -> Result<Handle, DeviceError>;

    /// Deliver a notification immediately (missed-reminder catch-up).
    async fn notify_now(&self, content: &NotificationContent) -> Result<(), DeviceError>;

    /// Cancel a specific armed notification. Idempotent: cancelling an
    /// already-fired or unknown handle is not an error.
    async fn cancel(&self, handle: &Handle) -> Result<(), DeviceError>;

    /// Cancel every armed notification. Only used as the first step of a
    /// full rearm, so no orphaned device timers survive a resync.
    async fn cancel_all(&self) -> Result<(), DeviceError>;

    /// Enumerate armed notifications. Diagnostics only, not on the hot path.
    async fn list_scheduled(&self) -> Result<Vec<Handle>, DeviceError>;
}
