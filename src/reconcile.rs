//! Reconciliation engine.
//!
//! Not a state machine with named states: a convergence function. Each task
//! lifecycle event recomputes the desired reminder from the task itself,
//! diffs it against the persisted row, and applies the smallest set of store
//! and device operations that makes them agree. The store is written first;
//! a device failure after a successful write is logged and left for the next
//! lifecycle sync, so persisted state never trails device state.

use crate::db::Database;
use crate::device::NotificationScheduler;
use crate::device::handle_map::HandleMap;
use crate::error::{SchedulerError, SchedulerResult};
use crate::time_math::compute_reminder_time;
use crate::types::{NotificationContent, TaskSnapshot};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Converges persisted reminders and armed device notifications with task
/// state. One instance per process, shared with [`crate::sync::LifecycleSync`].
pub struct Reconciler {
    db: Database,
    device: Arc<dyn NotificationScheduler>,
    handles: Arc<Mutex<HandleMap>>,
}

impl Reconciler {
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

    /// Entry point for task create/update/complete events.
    ///
    /// `previous` is the task as it looked before the edit, when the caller
    /// has it; reconciliation is skipped when no reminder-relevant field
    /// changed. Idempotent: replaying the same snapshot leaves one persisted
    /// row and one armed notification.
    pub async fn reconcile(
        &self,
        task: &TaskSnapshot,
        previous: Option<&TaskSnapshot>,
    ) -> SchedulerResult<()> {
        if let Some(prev) = previous {
            if prev.reminder_relevant_eq(task) {
                debug!("Task {} unchanged for scheduling, skipping", task.id);
                return Ok(());
            }
        }

        // Completed tasks never fire, even with the due time still ahead.
        let desired = if task.completed {
            None
        } else {
            compute_reminder_time(task.due_date, task.due_time, task.reminder_type)
        };

        let Some(fire_at) = desired else {
            return self.remove(&task.id).await;
        };

        if let Some(existing) = self
            .db
            .find_by_task(&task.id)
            .map_err(SchedulerError::Store)?
        {
            let converged = !existing.is_sent
                && existing.reminder_type == task.reminder_type
                && existing.reminder_time == fire_at;
            if converged {
                debug!("Reminder for task {} already converged", task.id);
                return Ok(());
            }
        }

        // Store first: once this returns the reminder is authoritative even
        // if every device call below fails.
        let reminder = self
            .db
            .upsert_reminder(&task.id, task.reminder_type, fire_at)
            .map_err(SchedulerError::Store)?;

        let stale = self.handles.lock().unwrap().remove(reminder.id);
        if let Some(handle) = stale {
            if let Err(e) = self.device.cancel(&handle).await {
                warn!("Could not cancel stale notification {}: {}", handle, e);
            }
        }

        if fire_at <= Utc::now() {
            // Already due. Persisted above so the missed sweep surfaces it;
            // arming would only earn a PastTimestamp error.
            debug!(
                "Reminder for task {} is already due ({}), leaving to missed sweep",
                task.id, fire_at
            );
            return Ok(());
        }

        let content = NotificationContent::for_task(&task.id, &task.title);
        match self.device.schedule_at(&content, fire_at).await {
            Ok(handle) => {
                self.handles.lock().unwrap().insert(reminder.id, handle);
            }
            Err(e) => {
                warn!(
                    "Device scheduling failed for task {} (will retry at next sync): {}",
                    task.id, e
                );
            }
        }

        Ok(())
    }

    /// Entry point for task deletion (and the teardown half of type→none and
    /// completion). Deletes the persisted reminder, then cancels whatever
    /// notification the handle map still knows about. Idempotent.
    pub async fn remove(&self, task_id: &str) -> SchedulerResult<()> {
        let existing = self
            .db
            .find_by_task(task_id)
            .map_err(SchedulerError::Store)?;

        self.db
            .delete_by_task(task_id)
            .map_err(SchedulerError::Store)?;

        if let Some(reminder) = existing {
            let handle = self.handles.lock().unwrap().remove(reminder.id);
            if let Some(handle) = handle {
                if let Err(e) = self.device.cancel(&handle).await {
                    warn!("Could not cancel notification {}: {}", handle, e);
                }
            }
        }

        Ok(())
    }
}
