//! Minimal task-row access.
//!
//! Task CRUD proper belongs to the task-management collaborator; the
//! scheduling core only needs the columns it joins through for user scoping
//! and notification text. `put_task` exists so that collaborator (and the
//! integration tests) can seed the rows the reminder queries join against.

use super::Database;
use crate::types::TaskSnapshot;
use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Row, params};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<TaskSnapshot> {
    let id: String = row.get("id")?;
    let user_id: String = row.get("user_id")?;
    let title: String = row.get("title")?;
    let due_date: Option<String> = row.get("due_date")?;
    let due_time: Option<String> = row.get("due_time")?;
    let reminder_type: String = row.get("reminder_type")?;
    let completed: bool = row.get("completed")?;

    Ok(TaskSnapshot {
        id,
        user_id,
        title,
        due_date: due_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        due_time: due_time.and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S").ok()),
        reminder_type: crate::types::ReminderType::from_str(&reminder_type).unwrap_or_default(),
        completed,
    })
}

impl Database {
    /// Insert or replace a task row.
    pub fn put_task(&self, task: &TaskSnapshot) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, user_id, title, due_date, due_time, reminder_type, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     user_id = excluded.user_id,
                     title = excluded.title,
                     due_date = excluded.due_date,
                     due_time = excluded.due_time,
                     reminder_type = excluded.reminder_type,
                     completed = excluded.completed",
                params![
                    task.id,
                    task.user_id,
                    task.title,
                    task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    task.due_time.map(|t| t.format("%H:%M:%S").to_string()),
                    task.reminder_type.as_str(),
                    task.completed,
                ],
            )?;
            Ok(())
        })
    }

    /// Fetch a task row by id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<TaskSnapshot>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
            match stmt.query_row(params![task_id], parse_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Delete a task row. Cascades to its reminder.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(())
        })
    }
}
