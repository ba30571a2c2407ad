//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::KeyValueStore;

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        // A poisoned lock only means a writer panicked; the map is still usable.
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryKvStore::new();

        assert_eq!(store.get("session"), None);

        store.set("session", "{}");
        assert_eq!(store.get("session"), Some("{}".to_string()));

        store.set("session", "[1]");
        assert_eq!(store.get("session"), Some("[1]".to_string()));

        store.remove("session");
        assert_eq!(store.get("session"), None);
    }

    #[test]
    fn test_remove_missing_key_is_a_noop() {
        let store = MemoryKvStore::new();
        store.remove("nope");
        assert_eq!(store.get("nope"), None);
    }
}
