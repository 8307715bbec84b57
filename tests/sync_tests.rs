//! Integration tests for lifecycle sync: missed sweep, expiry sweep, rearm.

use chrono::{Duration, Utc};
use remind_core::db::Database;
use remind_core::device::NotificationScheduler;
use remind_core::device::handle_map::HandleMap;
use remind_core::device::memory::MemoryScheduler;
use remind_core::error::SchedulerError;
use remind_core::sync::LifecycleSync;
use remind_core::types::{NotificationContent, ReminderType, TaskSnapshot};
use std::sync::{Arc, Mutex};

struct Harness {
    db: Database,
    device: Arc<MemoryScheduler>,
    handles: Arc<Mutex<HandleMap>>,
    sync: LifecycleSync,
    _dir: tempfile::TempDir,
}

fn setup() -> Harness {
    let db = Database::open_in_memory().expect("in-memory db");
    let device = Arc::new(MemoryScheduler::new());
    let dir = tempfile::tempdir().expect("tempdir");
    let handles = Arc::new(Mutex::new(HandleMap::load(dir.path().join("handles.json"))));
    let sync = LifecycleSync::new(
        db.clone(),
        device.clone() as Arc<dyn NotificationScheduler>,
        Arc::clone(&handles),
    );
    Harness {
        db,
        device,
        handles,
        sync,
        _dir: dir,
    }
}

fn seed_task(db: &Database, id: &str, user_id: &str) {
    db.put_task(&TaskSnapshot {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: format!("Task {}", id),
        due_date: None,
        due_time: None,
        reminder_type: ReminderType::AtTime,
        completed: false,
    })
    .expect("seed task");
}

/// Seed a task plus an unsent reminder offset from now by `offset`.
fn seed_reminder(h: &Harness, task_id: &str, offset: Duration) -> i64 {
    seed_task(&h.db, task_id, "u1");
    h.db.upsert_reminder(task_id, ReminderType::AtTime, Utc::now() + offset)
        .expect("seed reminder")
        .id
}

#[tokio::test]
async fn missed_sweep_notifies_and_marks_sent() {
    let h = setup();
    seed_reminder(&h, "overdue", Duration::hours(-1));

    let report = h.sync.run("u1").await.unwrap();

    assert_eq!(report.missed_notified, 1);
    assert_eq!(report.missed_failed, 0);
    let delivered = h.device.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(
        delivered[0],
        NotificationContent::missed("overdue", "Task overdue")
    );
    assert!(h.db.find_by_task("overdue").unwrap().unwrap().is_sent);
}

#[tokio::test]
async fn missed_sweep_respects_lookback_boundary() {
    let h = setup();
    seed_reminder(&h, "recent", Duration::hours(-23));
    seed_reminder(&h, "ancient", Duration::hours(-25));

    let report = h.sync.run("u1").await.unwrap();

    // Within the window: caught up and marked sent.
    assert_eq!(report.missed_notified, 1);
    assert!(h.db.find_by_task("recent").unwrap().unwrap().is_sent);

    // Outside the window: never replayed, never rearmed; the expiry sweep
    // retires it silently.
    let delivered = h.device.delivered();
    assert!(delivered.iter().all(|c| c.task_id != "ancient"));
    assert!(h.device.armed().is_empty());
    assert_eq!(report.expired, 1);
    assert!(h.db.find_by_task("ancient").unwrap().unwrap().is_sent);
}

#[tokio::test]
async fn second_sync_does_not_replay() {
    let h = setup();
    seed_reminder(&h, "overdue", Duration::hours(-2));

    h.sync.run("u1").await.unwrap();
    let report = h.sync.run("u1").await.unwrap();

    assert_eq!(report.missed_notified, 0);
    assert_eq!(h.device.delivered().len(), 1);
}

#[tokio::test]
async fn rearm_rebuilds_device_state_from_store() {
    let h = setup();
    let soon = seed_reminder(&h, "soon", Duration::hours(1));
    let later = seed_reminder(&h, "later", Duration::hours(6));

    // An orphaned device timer from a previous run must not survive.
    h.device
        .schedule_at(
            &NotificationContent::for_task("ghost", "Ghost"),
            Utc::now() + Duration::hours(9),
        )
        .await
        .unwrap();

    let report = h.sync.run("u1").await.unwrap();

    assert_eq!(report.rearmed, 2);
    assert_eq!(h.device.list_scheduled().await.unwrap().len(), 2);
    let armed = h.device.armed();
    assert_eq!(armed.len(), 2);
    assert!(armed.values().all(|n| n.content.task_id != "ghost"));

    let handles = h.handles.lock().unwrap();
    assert_eq!(handles.len(), 2);
    assert!(handles.get(soon).is_some());
    assert!(handles.get(later).is_some());
}

#[tokio::test]
async fn handle_map_is_replaced_wholesale() {
    let h = setup();
    h.handles
        .lock()
        .unwrap()
        .insert(999, "stale-handle".to_string());
    let id = seed_reminder(&h, "soon", Duration::hours(1));

    h.sync.run("u1").await.unwrap();

    let handles = h.handles.lock().unwrap();
    assert_eq!(handles.len(), 1);
    assert!(handles.get(999).is_none());
    assert!(handles.get(id).is_some());
}

#[tokio::test]
async fn notify_failures_do_not_abort_the_run() {
    let h = setup();
    seed_reminder(&h, "missed-a", Duration::hours(-1));
    seed_reminder(&h, "missed-b", Duration::hours(-2));
    seed_reminder(&h, "upcoming", Duration::hours(1));
    h.device.set_fail_notify(true);

    let report = h.sync.run("u1").await.unwrap();

    // Both catch-ups failed, stayed unsent, and the rearm still ran.
    assert_eq!(report.missed_failed, 2);
    assert_eq!(report.missed_notified, 0);
    assert!(!h.db.find_by_task("missed-a").unwrap().unwrap().is_sent);
    assert_eq!(report.rearmed, 1);

    // The next sync picks them up.
    h.device.set_fail_notify(false);
    let report = h.sync.run("u1").await.unwrap();
    assert_eq!(report.missed_notified, 2);
}

#[tokio::test]
async fn rearm_failures_leave_reminders_unsent() {
    let h = setup();
    seed_reminder(&h, "upcoming", Duration::hours(1));
    h.device.set_fail_schedule(true);

    let report = h.sync.run("u1").await.unwrap();

    assert_eq!(report.rearm_failed, 1);
    assert_eq!(report.rearmed, 0);
    assert!(h.handles.lock().unwrap().is_empty());
    assert!(!h.db.find_by_task("upcoming").unwrap().unwrap().is_sent);

    h.device.set_fail_schedule(false);
    let report = h.sync.run("u1").await.unwrap();
    assert_eq!(report.rearmed, 1);
}

#[tokio::test]
async fn store_failure_aborts_the_run_with_store_error() {
    let h = setup();
    seed_reminder(&h, "overdue", Duration::hours(-1));
    h.db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE reminders")?;
        Ok(())
    })
    .unwrap();

    let result = h.sync.run("u1").await;

    // The store is gone, so the run aborts before touching the device; the
    // shell retries at the next trigger.
    assert!(matches!(result, Err(SchedulerError::Store(_))));
    assert!(h.device.delivered().is_empty());
    assert!(h.device.armed().is_empty());
}

#[tokio::test]
async fn sync_is_scoped_to_the_user() {
    let h = setup();
    seed_reminder(&h, "mine", Duration::hours(-1));
    seed_task(&h.db, "theirs", "u2");
    h.db.upsert_reminder("theirs", ReminderType::AtTime, Utc::now() - Duration::hours(1))
        .unwrap();

    let report = h.sync.run("u1").await.unwrap();

    assert_eq!(report.missed_notified, 1);
    assert!(!h.db.find_by_task("theirs").unwrap().unwrap().is_sent);
}
