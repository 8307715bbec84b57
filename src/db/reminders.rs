//! Reminder store adapter: CRUD scoped by task and by user.
//!
//! The single structural invariant lives here: at most one reminder per task.
//! `upsert` is find-then-replace (UNIQUE(task_id) backs it up), never a blind
//! insert, so no call sequence can produce two rows for one task.

use super::{Database, parse_ts, ts};
use crate::types::{PendingReminder, Reminder, ReminderType};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Row, params};

pub(crate) fn parse_reminder_row(row: &Row) -> rusqlite::Result<Reminder> {
    let id: i64 = row.get("id")?;
    let task_id: String = row.get("task_id")?;
    let reminder_type: String = row.get("reminder_type")?;
    let reminder_time: String = row.get("reminder_time")?;
    let is_sent: bool = row.get("is_sent")?;

    Ok(Reminder {
        id,
        task_id,
        reminder_type: ReminderType::from_str(&reminder_type).unwrap_or_default(),
        reminder_time: parse_ts(&reminder_time).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        is_sent,
    })
}

fn parse_pending_row(row: &Row) -> rusqlite::Result<PendingReminder> {
    let reminder = parse_reminder_row(row)?;
    let task_title: String = row.get("task_title")?;
    Ok(PendingReminder {
        reminder,
        task_title,
    })
}

impl Database {
    /// Fetch the reminder for a task, if one exists.
    pub fn find_by_task(&self, task_id: &str) -> Result<Option<Reminder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM reminders WHERE task_id = ?1")?;
            match stmt.query_row(params![task_id], parse_reminder_row) {
                Ok(reminder) => Ok(Some(reminder)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Create or replace the reminder for a task, resetting `is_sent`.
    ///
    /// Updates in place when a row exists so the reminder id stays stable
    /// across reschedules of the same task.
    pub fn upsert_reminder(
        &self,
        task_id: &str,
        reminder_type: ReminderType,
        reminder_time: DateTime<Utc>,
    ) -> Result<Reminder> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reminders (task_id, reminder_type, reminder_time, is_sent)
                 VALUES (?1, ?2, ?3, 0)
                 ON CONFLICT(task_id) DO UPDATE SET
                     reminder_type = excluded.reminder_type,
                     reminder_time = excluded.reminder_time,
                     is_sent = 0",
                params![task_id, reminder_type.as_str(), ts(reminder_time)],
            )?;

            let mut stmt = conn.prepare("SELECT * FROM reminders WHERE task_id = ?1")?;
            stmt.query_row(params![task_id], parse_reminder_row)
                .map_err(|e| anyhow!("reminder missing after upsert for task {task_id}: {e}"))
        })
    }

    /// Remove the reminder for a task. Idempotent; no error when none exists.
    pub fn delete_by_task(&self, task_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM reminders WHERE task_id = ?1", params![task_id])?;
            Ok(())
        })
    }

    /// All unsent, future reminders for a user's open tasks, soonest first.
    pub fn list_active(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<PendingReminder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.*, t.title AS task_title
                 FROM reminders r
                 JOIN tasks t ON t.id = r.task_id
                 WHERE t.user_id = ?1
                   AND t.completed = 0
                   AND r.is_sent = 0
                   AND r.reminder_time >= ?2
                 ORDER BY r.reminder_time ASC",
            )?;
            let rows = stmt.query_map(params![user_id, ts(now)], parse_pending_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Unsent reminders whose fire time fell within the lookback window
    /// ending at `now`. Older ones are excluded to bound replay after long
    /// absences.
    pub fn list_missed(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<Vec<PendingReminder>> {
        let floor = now - lookback;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.*, t.title AS task_title
                 FROM reminders r
                 JOIN tasks t ON t.id = r.task_id
                 WHERE t.user_id = ?1
                   AND t.completed = 0
                   AND r.is_sent = 0
                   AND r.reminder_time >= ?2
                   AND r.reminder_time <= ?3
                 ORDER BY r.reminder_time ASC",
            )?;
            let rows = stmt.query_map(params![user_id, ts(floor), ts(now)], parse_pending_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Mark a reminder as sent. Monotonic and idempotent.
    pub fn mark_sent(&self, reminder_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE reminders SET is_sent = 1 WHERE id = ?1",
                params![reminder_id],
            )?;
            Ok(())
        })
    }

    /// Mark unsent reminders older than the lookback window as sent without
    /// notifying, so they stop accumulating. Returns the number expired.
    pub fn expire_stale(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        lookback: Duration,
    ) -> Result<usize> {
        let floor = now - lookback;
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE reminders SET is_sent = 1
                 WHERE is_sent = 0
                   AND reminder_time < ?2
                   AND task_id IN (SELECT id FROM tasks WHERE user_id = ?1)",
                params![user_id, ts(floor)],
            )?;
            Ok(n)
        })
    }
}
