mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value slot that remembers the last selection across sessions.
///
/// Reads and writes are last-writer-wins; no transactional semantics.
pub trait SelectionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, for tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a slot, standing in for state left by an earlier
    /// session.
    pub fn with_slot(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .slots
            .lock()
            .expect("slot lock poisoned")
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl SelectionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().expect("slot lock poisoned").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .lock()
            .expect("slot lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
