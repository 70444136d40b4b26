//! Typed Store
//!
//! Values are parsed into records at this boundary. A value that fails to
//! parse is reported as [`StorageError::Corrupt`]; callers that only need a
//! best-effort view use [`IsmsStore::load_or_default`], which treats it as
//! absent.

use crate::error::{StorageError, StorageResult};
use crate::events::{ChangeBus, ChangeEvent};
use crate::storage::{InMemoryStore, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Largest serialized value accepted by [`IsmsStore::write`] (4.5 MB)
pub const MAX_SAVE_BYTES: usize = 9 * 512 * 1024;

/// Typed store over a key-value backend
#[derive(Clone)]
pub struct IsmsStore {
    backend: Arc<dyn KeyValueStore>,
    bus: ChangeBus,
}

impl IsmsStore {
    /// Wrap backend
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            bus: ChangeBus::new(),
        }
    }

    /// Store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Change bus notified after writes
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Raw value
    pub fn raw(&self, key: &str) -> StorageResult<Option<String>> {
        self.backend.get_item(key)
    }

    /// Write raw value and notify
    pub fn write_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        if value.len() > MAX_SAVE_BYTES {
            return Err(StorageError::PayloadTooLarge {
                size: value.len(),
                max: MAX_SAVE_BYTES,
            });
        }
        self.backend.set_item(key, value)?;
        tracing::info!("Saved '{}' ({} bytes)", key, value.len());
        self.bus.publish(&ChangeEvent::local(key));
        Ok(())
    }

    /// Parse value under `key`
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.backend.get_item(key)? else {
            tracing::debug!("No data under '{}'", key);
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Parse value under `key`, treating absent or unreadable data as `None`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring stored '{}': {}", key, e);
                None
            }
        }
    }

    /// Parse value under `key`, falling back to `T::default()`
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Serialize and write `value` under `key`
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.write_raw(key, &raw)
    }

    /// Remove value and notify
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove_item(key)?;
        self.bus.publish(&ChangeEvent::local(key));
        Ok(())
    }

    /// Stored keys
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        self.backend.keys()
    }

    /// Reload the backend and publish external changes, returning how many
    /// keys changed
    pub fn sync_external(&self) -> StorageResult<usize> {
        let changed = self.backend.reload()?;
        for key in &changed {
            self.bus.publish(&ChangeEvent::external(key));
        }
        Ok(changed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeOrigin;
    use crate::storage::FileStore;
    use parking_lot::Mutex;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        items: Vec<u32>,
    }

    #[test]
    fn test_write_then_read_typed() {
        let store = IsmsStore::in_memory();
        let rec = Record { name: "x".into(), items: vec![1, 2] };

        store.write("k", &rec).unwrap();
        assert_eq!(store.read::<Record>("k").unwrap(), Some(rec));
        assert_eq!(store.read::<Record>("missing").unwrap(), None);
    }

    #[test]
    fn test_corrupt_value_is_error_on_read_and_absent_on_load() {
        let store = IsmsStore::in_memory();
        store.write_raw("k", "{not json").unwrap();

        assert!(store.read::<Record>("k").unwrap_err().is_corrupt());
        assert_eq!(store.load::<Record>("k"), None);
        assert_eq!(store.load_or_default::<Record>("k"), Record::default());
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let store = IsmsStore::in_memory();
        store.write_raw("k", "[1,2,3]").unwrap();
        assert!(store.read::<Record>("k").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_oversized_payload_rejected_without_write() {
        let store = IsmsStore::in_memory();
        let big = "a".repeat(MAX_SAVE_BYTES + 1);

        let err = store.write_raw("k", &big).unwrap_err();
        assert!(matches!(err, StorageError::PayloadTooLarge { .. }));
        assert_eq!(store.raw("k").unwrap(), None);
    }

    #[test]
    fn test_writes_notify_bus() {
        let store = IsmsStore::in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.bus().subscribe(move |e| sink.lock().push(e.key.clone()));

        store.write("a", &1).unwrap();
        store.remove("a").unwrap();

        assert_eq!(*seen.lock(), vec!["a".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_sync_external_publishes_changed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isms.json");

        let store = IsmsStore::new(Arc::new(FileStore::open(&path).unwrap()));
        let other = FileStore::open(&path).unwrap();
        other.set_item("riskTreatments", "[]").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.bus().subscribe(move |e| sink.lock().push(e.clone()));

        assert_eq!(store.sync_external().unwrap(), 1);
        let seen = seen.lock();
        assert_eq!(seen[0].key, "riskTreatments");
        assert_eq!(seen[0].origin, ChangeOrigin::External);
    }
}
