//! Core types for the reminder scheduling core.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier returned by the OS when a local notification is armed.
/// Never persisted to the remote store; only cached in the local handle map.
pub type Handle = String;

/// Offset policy relating a reminder's fire time to the task's due time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    #[default]
    None,
    AtTime,
    FiveMinBefore,
    FifteenMinBefore,
    ThirtyMinBefore,
    OneHourBefore,
    OneDayBefore,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::None => "none",
            ReminderType::AtTime => "at_time",
            ReminderType::FiveMinBefore => "5_min_before",
            ReminderType::FifteenMinBefore => "15_min_before",
            ReminderType::ThirtyMinBefore => "30_min_before",
            ReminderType::OneHourBefore => "1_hour_before",
            ReminderType::OneDayBefore => "1_day_before",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ReminderType::None),
            "at_time" => Some(ReminderType::AtTime),
            "5_min_before" => Some(ReminderType::FiveMinBefore),
            "15_min_before" => Some(ReminderType::FifteenMinBefore),
            "30_min_before" => Some(ReminderType::ThirtyMinBefore),
            "1_hour_before" => Some(ReminderType::OneHourBefore),
            "1_day_before" => Some(ReminderType::OneDayBefore),
            _ => None,
        }
    }
}

/// A persisted reminder: "notify once, at `reminder_time`, about `task_id`".
///
/// At most one reminder exists per task; `is_sent` only ever transitions
/// false→true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub task_id: String,
    pub reminder_type: ReminderType,
    pub reminder_time: DateTime<Utc>,
    pub is_sent: bool,
}

/// The reminder-relevant view of a task, as handed over by the task-CRUD
/// collaborator on lifecycle events. The scheduling core reads these fields
/// and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub reminder_type: ReminderType,
    #[serde(default)]
    pub completed: bool,
}

impl TaskSnapshot {
    /// True when none of the fields that feed reminder scheduling differ.
    pub fn reminder_relevant_eq(&self, other: &TaskSnapshot) -> bool {
        self.due_date == other.due_date
            && self.due_time == other.due_time
            && self.reminder_type == other.reminder_type
            && self.completed == other.completed
    }
}

/// A reminder joined with the title of its owning task, as returned by the
/// active/missed store queries for notification composition.
#[derive(Debug, Clone)]
pub struct PendingReminder {
    pub reminder: Reminder,
    pub task_title: String,
}

/// Payload handed to the device notification scheduler. `task_id` rides along
/// so a tap on the notification can deep-link back to the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub task_id: String,
}

impl NotificationContent {
    /// Content for a regularly scheduled reminder.
    pub fn for_task(task_id: &str, task_title: &str) -> Self {
        Self {
            title: "Task reminder".to_string(),
            body: task_title.to_string(),
            task_id: task_id.to_string(),
        }
    }

    /// Content for a catch-up notification fired by the missed sweep.
    pub fn missed(task_id: &str, task_title: &str) -> Self {
        Self {
            title: "Missed reminder".to_string(),
            body: task_title.to_string(),
            task_id: task_id.to_string(),
        }
    }
}
