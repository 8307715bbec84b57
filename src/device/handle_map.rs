//! Local reminder→handle cache.
//!
//! Maps reminder ids to device notification handles so a single notification
//! can be cancelled without cancelling the rest. Strictly derived state: it
//! lives in a local JSON file, may be stale or missing (app reinstall), and
//! lifecycle sync rebuilds it wholesale from the store's active set. Losing
//! it is never an error.

use crate::types::Handle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HANDLE_MAP_FILE: &str = "reminder_handles.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Entries {
    handles: HashMap<i64, Handle>,
}

/// Disposable reminder-id → device-handle map persisted as a JSON file.
#[derive(Debug)]
pub struct HandleMap {
    path: PathBuf,
    entries: Entries,
}

impl HandleMap {
    /// Load the map from `path`. Missing or unreadable files degrade to an
    /// empty map; lifecycle sync reconstructs the contents.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Discarding corrupt handle map at {}: {}", path.display(), e);
                    Entries::default()
                }
            },
            Err(_) => Entries::default(),
        };
        Self { path, entries }
    }

    /// Load from the platform-default location.
    pub fn load_default() -> Self {
        let dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::load(dir.join("remind-core").join(HANDLE_MAP_FILE))
    }

    pub fn get(&self, reminder_id: i64) -> Option<&Handle> {
        self.entries.handles.get(&reminder_id)
    }

    /// Record the handle for a reminder, returning the one it displaces.
    pub fn insert(&mut self, reminder_id: i64, handle: Handle) -> Option<Handle> {
        let old = self.entries.handles.insert(reminder_id, handle);
        self.persist();
        old
    }

    /// Drop the entry for a reminder, returning the handle if one was cached.
    pub fn remove(&mut self, reminder_id: i64) -> Option<Handle> {
        let old = self.entries.handles.remove(&reminder_id);
        if old.is_some() {
            self.persist();
        }
        old
    }

    /// Replace the whole map at once, as the rearm step does. Incremental
    /// patching is avoided on purpose; wholesale replacement cannot diverge.
    pub fn replace_all(&mut self, handles: HashMap<i64, Handle>) {
        self.entries.handles = handles;
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.entries.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.handles.is_empty()
    }

    /// Best-effort write-through. A failed write only costs precision on the
    /// next cancel; the store stays authoritative.
    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Could not create handle map dir {}: {}", parent.display(), e);
                return;
            }
        }
        match serde_json::to_string(&self.entries) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    warn!("Could not persist handle map to {}: {}", self.path.display(), e);
                } else {
                    debug!("Persisted {} handle(s)", self.entries.handles.len());
                }
            }
            Err(e) => warn!("Could not serialize handle map: {}", e),
        }
    }
}
