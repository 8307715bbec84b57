//! Reminder scheduling core for a to-do application.
//!
//! Computes when a task's reminder should fire, persists that schedule, and
//! keeps OS-level local notifications consistent with it across restarts and
//! foreground transitions. The app shell drives it through two entry points:
//! [`reconcile::Reconciler::reconcile`] on task lifecycle events and
//! [`sync::LifecycleSync::run`] on launch/foreground.

pub mod db;
pub mod device;
pub mod error;
pub mod reconcile;
pub mod routing;
pub mod sync;
pub mod time_math;
pub mod types;
