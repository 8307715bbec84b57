//! Pure fire-time computation.
//!
//! Due dates are entered by the user as local calendar dates, so the anchor
//! is interpreted in the system's local time zone and converted to UTC for
//! storage. No I/O, no clock reads: a past result is returned as-is and left
//! to the caller (the missed sweep picks it up).

use crate::types::ReminderType;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// Default anchor time applied when a task has a due date but no due time.
pub const DEFAULT_DUE_TIME: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// Compute the absolute fire time for a reminder.
///
/// Returns `None` when no reminder should exist: `reminder_type` is `None`,
/// or the task has no due date.
pub fn compute_reminder_time(
    due_date: Option<NaiveDate>,
    due_time: Option<NaiveTime>,
    reminder_type: ReminderType,
) -> Option<DateTime<Utc>> {
    let offset = reminder_offset(reminder_type)?;
    let date = due_date?;
    let anchor = local_to_utc(date, due_time.unwrap_or(DEFAULT_DUE_TIME))?;
    Some(anchor - offset)
}

/// Offset subtracted from the due anchor, or `None` for `ReminderType::None`.
fn reminder_offset(reminder_type: ReminderType) -> Option<Duration> {
    match reminder_type {
        ReminderType::None => None,
        ReminderType::AtTime => Some(Duration::zero()),
        ReminderType::FiveMinBefore => Some(Duration::minutes(5)),
        ReminderType::FifteenMinBefore => Some(Duration::minutes(15)),
        ReminderType::ThirtyMinBefore => Some(Duration::minutes(30)),
        ReminderType::OneHourBefore => Some(Duration::hours(1)),
        ReminderType::OneDayBefore => Some(Duration::hours(24)),
    }
}

/// Resolve a local wall-clock date+time to a UTC instant.
///
/// DST edges: an ambiguous wall time takes the earliest instant; a
/// nonexistent wall time (spring-forward gap) is shifted forward one hour.
fn local_to_utc(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => Local
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
