//! Process-wide notification plumbing.
//!
//! The OS accepts exactly one notification handler per process, registered
//! once at startup; [`initialize`] makes that registration idempotent so the
//! shell can call it from any entry point without double-handling. Tap
//! routing is a single listener that receives the tapped task id and hands
//! off to the navigation collaborator; it consumes reminders, it is not part
//! of reconciliation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

type TapListener = Box<dyn Fn(&str) + Send + Sync>;

static TAP_LISTENER: Mutex<Option<TapListener>> = Mutex::new(None);

/// Perform one-time process-wide registration. Returns `true` on the call
/// that actually initialized; every later call is a no-op returning `false`.
pub fn initialize() -> bool {
    let first = INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();
    if first {
        debug!("Notification handler registered");
    }
    first
}

/// Register the single tap listener. Replaces any previous listener, so a
/// stale registration cannot cause duplicate handling.
pub fn set_tap_listener<F>(listener: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    *TAP_LISTENER.lock().unwrap() = Some(Box::new(listener));
}

/// Route a notification tap to the registered listener. Taps arriving before
/// a listener is registered are dropped with a log line.
pub fn route_tap(task_id: &str) {
    let listener = TAP_LISTENER.lock().unwrap();
    match listener.as_ref() {
        Some(f) => f(task_id),
        None => debug!("Notification tap for task {} with no listener", task_id),
    }
}
