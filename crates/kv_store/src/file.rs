//! File-backed key-value store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::warn;

use crate::KeyValueStore;

/// Key-value store persisted as a single JSON object on disk.
///
/// The whole map is rewritten on every mutation. Durability is best
/// effort: a failed write is logged and the in-memory state stays
/// authoritative for the rest of the process, mirroring the substrate
/// this store emulates.
pub struct FileKvStore {
    path: PathBuf,
    slots: RwLock<HashMap<String, String>>,
}

impl FileKvStore {
    /// Opens the store at `path`, loading any existing contents.
    ///
    /// A missing or malformed file is treated as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slots = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(slots) => slots,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding malformed store file");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            slots: RwLock::new(slots),
        }
    }

    fn flush(&self, slots: &HashMap<String, String>) {
        let raw = match serde_json::to_string(slots) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to encode store file");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, raw) {
            warn!(path = %self.path.display(), error = %e, "failed to persist store file");
        }
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        // The write lock is held across the flush so file images are never
        // interleaved between racing writers.
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        self.flush(&slots);
    }

    fn remove(&self, key: &str) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(key);
        self.flush(&slots);
    }
}
