//! In-memory notification scheduler.
//!
//! Backs the integration tests and host-side harnesses where no OS
//! notification service exists. Records what a real device would have armed
//! or delivered, and can be told to fail to exercise the error paths.

use super::NotificationScheduler;
use crate::error::DeviceError;
use crate::types::{Handle, NotificationContent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A notification armed on the fake device.
#[derive(Debug, Clone)]
pub struct ArmedNotification {
    pub content: NotificationContent,
    pub fire_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    armed: HashMap<Handle, ArmedNotification>,
    delivered: Vec<NotificationContent>,
    cancelled: Vec<Handle>,
}

/// Fake device scheduler with inspectable state.
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    state: Mutex<State>,
    next_handle: AtomicU64,
    fail_schedule: AtomicBool,
    fail_notify: AtomicBool,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `schedule_at` calls fail as if the OS denied them.
    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `notify_now` calls fail.
    pub fn set_fail_notify(&self, fail: bool) {
        self.fail_notify.store(fail, Ordering::SeqCst);
    }

    /// Currently armed notifications, keyed by handle.
    pub fn armed(&self) -> HashMap<Handle, ArmedNotification> {
        self.state.lock().unwrap().armed.clone()
    }

    /// Immediately delivered notifications, in dispatch order.
    pub fn delivered(&self) -> Vec<NotificationContent> {
        self.state.lock().unwrap().delivered.clone()
    }

    /// Every handle ever passed to `cancel`.
    pub fn cancelled(&self) -> Vec<Handle> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl NotificationScheduler for MemoryScheduler {
    async fn schedule_at(
        &self,
        content: &NotificationContent,
        fire_at: DateTime<Utc>,
    ) -> Result<Handle, DeviceError> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(DeviceError::Denied);
        }
        if fire_at <= Utc::now() {
            return Err(DeviceError::PastTimestamp(fire_at));
        }
        let handle = format!("mem-{}", self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.state.lock().unwrap().armed.insert(
            handle.clone(),
            ArmedNotification {
                content: content.clone(),
                fire_at,
            },
        );
        Ok(handle)
    }

    async fn notify_now(&self, content: &NotificationContent) -> Result<(), DeviceError> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(DeviceError::Failed("notify_now disabled".to_string()));
        }
        self.state.lock().unwrap().delivered.push(content.clone());
        Ok(())
    }

    async fn cancel(&self, handle: &Handle) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.armed.remove(handle);
        state.cancelled.push(handle.clone());
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), DeviceError> {
        self.state.lock().unwrap().armed.clear();
        Ok(())
    }

    async fn list_scheduled(&self) -> Result<Vec<Handle>, DeviceError> {
        Ok(self.state.lock().unwrap().armed.keys().cloned().collect())
    }
}
