//! Lifecycle sync.
//!
//! Runs on cold start and on every foreground transition. Three passes, each
//! an idempotent recomputation from the store, so there is no sync state to
//! persist and an interrupted run just repeats at the next trigger:
//!
//! 1. missed sweep — catch-up notification plus `mark_sent` for every unsent
//!    reminder that came due within the lookback window;
//! 2. expiry sweep — unsent reminders older than the window are marked sent
//!    without notifying, so they cannot pile up across long absences;
//! 3. active rearm — cancel every device timer, re-arm from the store's
//!    active set, and rebuild the handle map wholesale.

use crate::db::Database;
use crate::device::NotificationScheduler;
use crate::device::handle_map::HandleMap;
use crate::error::{SchedulerError, SchedulerResult};
use crate::types::NotificationContent;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// How far back the missed sweep reaches. Anything older is expired silently
/// rather than replayed.
pub const MISSED_LOOKBACK_HOURS: i64 = 24;

/// What a sync run did, for shell-side logging and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub missed_notified: usize,
    pub missed_failed: usize,
    pub expired: usize,
    pub rearmed: usize,
    pub rearm_failed: usize,
}

/// Re-derives device notification state from the reminder store.
pub struct LifecycleSync {
    db: Database,
    device: Arc<dyn NotificationScheduler>,
    handles: Arc<Mutex<HandleMap>>,
}

impl LifecycleSync {
    pub fn new(
        db: Database,
        device: Arc<dyn NotificationScheduler>,
        handles: Arc<Mutex<HandleMap>>,
    ) -> Self {
        Self {
            db,
            device,
            handles,
        }
    }

    /// Entry point for app launch and foreground transitions.
    ///
    /// A store read failure aborts with an error (the shell retries at the
    /// next trigger); device failures are per-item, logged, and never abort
    /// the run.
    pub async fn run(&self, user_id: &str) -> SchedulerResult<SyncReport> {
        let now = Utc::now();
        let lookback = Duration::hours(MISSED_LOOKBACK_HOURS);
        let mut report = SyncReport::default();

        // Missed sweep. Runs before the rearm so everything it marks sent is
        // already out of the active set.
        let missed = self
            .db
            .list_missed(user_id, now, lookback)
            .map_err(SchedulerError::Store)?;
        for item in &missed {
            let content = NotificationContent::missed(&item.reminder.task_id, &item.task_title);
            match self.device.notify_now(&content).await {
                Ok(()) => match self.db.mark_sent(item.reminder.id) {
                    Ok(()) => report.missed_notified += 1,
                    Err(e) => {
                        // Delivered but not recorded; the next sweep repeats
                        // it, which beats losing it.
                        warn!("mark_sent failed for reminder {}: {}", item.reminder.id, e);
                        report.missed_failed += 1;
                    }
                },
                Err(e) => {
                    warn!(
                        "Catch-up notification failed for task {}: {}",
                        item.reminder.task_id, e
                    );
                    report.missed_failed += 1;
                }
            }
        }

        // Expiry sweep: housekeeping, not worth aborting the rearm over.
        match self.db.expire_stale(user_id, now, lookback) {
            Ok(n) => report.expired = n,
            Err(e) => warn!("Expiry sweep failed: {}", e),
        }

        // Full rearm from the store's active set.
        if let Err(e) = self.device.cancel_all().await {
            warn!("cancel_all failed, proceeding with rearm: {}", e);
        }

        let active = self
            .db
            .list_active(user_id, now)
            .map_err(SchedulerError::Store)?;
        let mut rebuilt: HashMap<i64, String> = HashMap::new();
        for item in &active {
            let content = NotificationContent::for_task(&item.reminder.task_id, &item.task_title);
            match self
                .device
                .schedule_at(&content, item.reminder.reminder_time)
                .await
            {
                Ok(handle) => {
                    rebuilt.insert(item.reminder.id, handle);
                    report.rearmed += 1;
                }
                Err(e) => {
                    warn!(
                        "Rearm failed for reminder {} (still unsent, retried next sync): {}",
                        item.reminder.id, e
                    );
                    report.rearm_failed += 1;
                }
            }
        }
        self.handles.lock().unwrap().replace_all(rebuilt);

        info!(
            "Lifecycle sync for {}: {} caught up ({} failed), {} expired, {} rearmed ({} failed)",
            user_id,
            report.missed_notified,
            report.missed_failed,
            report.expired,
            report.rearmed,
            report.rearm_failed
        );
        Ok(report)
    }
}
