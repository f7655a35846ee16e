//! Durable key-value slots shared by the editor and rendering contexts.
//!
//! Two slots exist: a cross-session one holding the last explicitly saved
//! configuration, and a session-scoped one holding the current draft. The
//! editor writes both on every mutation; a freshly created rendering context
//! reads the cross-session slot first and falls back to the session slot.
//! Writes are whole snapshots, so concurrent writers resolve as last writer
//! wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key under which the configuration is stored in both slots.
pub const STORAGE_KEY: &str = "landing-config";

/// Errors that can occur when reading or writing storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Quota exceeded writing {key}: {size} bytes over a {limit} byte limit")]
    QuotaExceeded { key: String, size: usize, limit: usize },

    #[error("Failed to read {key}: {message}")]
    ReadError { key: String, message: String },

    #[error("Failed to write {key}: {message}")]
    WriteError { key: String, message: String },

    #[error("Failed to encode value: {0}")]
    EncodeError(String),
}

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-lifetime store, used for the session-scoped slot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects values larger than `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(limit),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON file per key, used for the cross-session slot.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let write_error = |e: std::io::Error| StorageError::WriteError {
            key: key.to_string(),
            message: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(write_error)?;
        // Write-then-rename so a reader never sees a half-written snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(write_error)?;
        fs::rename(&tmp, &path).map_err(write_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// The saved and draft slots, addressed under one key.
#[derive(Clone)]
pub struct DurableSlots {
    saved: Arc<dyn KeyValueStore>,
    draft: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for DurableSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableSlots")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl DurableSlots {
    /// Slots over a cross-session `saved` store and a session-scoped `draft` store.
    pub fn new(saved: Arc<dyn KeyValueStore>, draft: Arc<dyn KeyValueStore>) -> Self {
        Self {
            saved,
            draft,
            key: STORAGE_KEY.to_string(),
        }
    }

    /// Both slots in memory. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Cross-session slot in `dir`, session slot in memory.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(dir)), Arc::new(MemoryStore::new()))
    }

    /// Mirror `value` into both slots.
    ///
    /// Failures are logged and swallowed; they must never block the edit that
    /// produced the value.
    pub fn mirror<T: Serialize>(&self, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode snapshot for storage: {}", e);
                return;
            }
        };

        for (name, slot) in [("saved", &self.saved), ("draft", &self.draft)] {
            if let Err(e) = slot.set(&self.key, &json) {
                tracing::warn!("Failed to mirror snapshot into {} slot: {}", name, e);
            }
        }
    }

    /// Write `value` into the cross-session slot.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(value).map_err(|e| StorageError::EncodeError(e.to_string()))?;
        self.saved.set(&self.key, &json)
    }

    /// Read the stored value, preferring the cross-session slot.
    ///
    /// Unreadable or unparseable slots are skipped. Returns `None` when no
    /// slot holds a usable value.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        for (name, slot) in [("saved", &self.saved), ("draft", &self.draft)] {
            match slot.get(&self.key) {
                Ok(Some(json)) => match serde_json::from_str(&json) {
                    Ok(value) => return Some(value),
                    Err(e) => tracing::warn!("Ignoring unparseable {} slot: {}", name, e),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to read {} slot: {}", name, e),
            }
        }
        None
    }

    /// Clear both slots.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.saved.remove(&self.key)?;
        self.draft.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mirror_writes_both_slots() {
        let saved = Arc::new(MemoryStore::new());
        let draft = Arc::new(MemoryStore::new());
        let slots = DurableSlots::new(saved.clone(), draft.clone());

        slots.mirror(&vec![1, 2, 3]);

        assert_eq!(saved.get(STORAGE_KEY).unwrap().as_deref(), Some("[1,2,3]"));
        assert_eq!(draft.get(STORAGE_KEY).unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn load_prefers_saved_slot() {
        let saved = Arc::new(MemoryStore::new());
        let draft = Arc::new(MemoryStore::new());
        saved.set(STORAGE_KEY, "\"saved\"").unwrap();
        draft.set(STORAGE_KEY, "\"draft\"").unwrap();

        let slots = DurableSlots::new(saved, draft);

        assert_eq!(slots.load::<String>().as_deref(), Some("saved"));
    }

    #[test]
    fn load_falls_back_to_draft_slot() {
        let draft = Arc::new(MemoryStore::new());
        draft.set(STORAGE_KEY, "\"draft\"").unwrap();
        let slots = DurableSlots::new(Arc::new(MemoryStore::new()), draft);

        assert_eq!(slots.load::<String>().as_deref(), Some("draft"));
    }

    #[test]
    fn load_skips_corrupt_saved_slot() {
        let saved = Arc::new(MemoryStore::new());
        let draft = Arc::new(MemoryStore::new());
        saved.set(STORAGE_KEY, "{not json").unwrap();
        draft.set(STORAGE_KEY, "\"draft\"").unwrap();

        let slots = DurableSlots::new(saved, draft);

        assert_eq!(slots.load::<String>().as_deref(), Some("draft"));
    }

    #[test]
    fn empty_slots_load_nothing() {
        assert_eq!(DurableSlots::in_memory().load::<String>(), None);
    }

    #[test]
    fn quota_failure_does_not_block_other_slot() {
        let saved = Arc::new(MemoryStore::with_quota(4));
        let draft = Arc::new(MemoryStore::new());
        let slots = DurableSlots::new(saved.clone(), draft.clone());

        slots.mirror(&"a long snapshot");

        assert_eq!(saved.get(STORAGE_KEY).unwrap(), None);
        assert!(draft.get(STORAGE_KEY).unwrap().is_some());
        assert!(matches!(
            slots.save(&"a long snapshot"),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let temp = tempdir().unwrap();

        DurableSlots::on_disk(temp.path()).save(&"kept").unwrap();
        let reopened = DurableSlots::on_disk(temp.path());

        assert_eq!(reopened.load::<String>().as_deref(), Some("kept"));
        assert!(temp.path().join("landing-config.json").exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn clear_empties_both_slots() {
        let slots = DurableSlots::in_memory();
        slots.mirror(&1);
        slots.clear().unwrap();

        assert_eq!(slots.load::<i32>(), None);
    }
}
