//! Key-Value Storage Backends
//!
//! Backends hold raw string values keyed by string identifiers. Writes are
//! synchronous and last-writer-wins per key.

use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default total quota per backend (5 MB)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Key-value storage trait
pub trait KeyValueStore: Send + Sync {
    /// Get raw value
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Set raw value, replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove value (no-op when absent)
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// List keys
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Pick up writes made by another process, returning the keys that changed
    fn reload(&self) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Bytes held after replacing `key` with `value`
fn projected_usage(items: &BTreeMap<String, String>, key: &str, value: &str) -> usize {
    let others: usize = items
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
    others + key.len() + value.len()
}

fn check_quota(
    items: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    limit: usize,
) -> StorageResult<()> {
    let used = projected_usage(items, key, value);
    if used > limit {
        return Err(StorageError::QuotaExceeded { used, limit });
    }
    Ok(())
}

/// In-memory store (for testing and one-shot sessions)
pub struct InMemoryStore {
    items: RwLock<BTreeMap<String, String>>,
    quota: usize,
}

impl InMemoryStore {
    /// Create empty store with the default quota
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Create empty store with a custom quota
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            quota,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        check_quota(&items, key, value, self.quota)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().keys().cloned().collect())
    }
}

/// JSON-file store
///
/// The whole key space lives in one JSON object on disk. Every write
/// re-reads the file, replaces only its own key and rewrites the file through
/// a temporary sibling and a rename, so concurrent writers to different keys
/// do not overwrite each other. Other keys changed on disk stay invisible
/// until [`KeyValueStore::reload`].
pub struct FileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
    quota: usize,
}

impl FileStore {
    /// Open store at `path`, starting empty when the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let items = read_file(&path)?;
        tracing::debug!("Opened file store {} with {} keys", path.display(), items.len());
        Ok(Self {
            path,
            items: RwLock::new(items),
            quota: DEFAULT_QUOTA_BYTES,
        })
    }

    /// Override quota
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&self, key: &str, value: Option<&str>) -> StorageResult<()> {
        let mut on_disk = read_file(&self.path)?;
        match value {
            Some(v) => {
                check_quota(&on_disk, key, v, self.quota)?;
                on_disk.insert(key.to_string(), v.to_string());
            }
            None => {
                if on_disk.remove(key).is_none() {
                    return Ok(());
                }
            }
        }
        self.persist(&on_disk)
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_file(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
        key: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        self.write_through(key, Some(value))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        self.write_through(key, None)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().keys().cloned().collect())
    }

    fn reload(&self) -> StorageResult<Vec<String>> {
        let fresh = read_file(&self.path)?;
        let mut items = self.items.write();

        let mut changed: Vec<String> = fresh
            .iter()
            .filter(|(k, v)| items.get(k.as_str()) != Some(v))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(items.keys().filter(|k| !fresh.contains_key(*k)).cloned());
        changed.sort();

        *items = fresh;
        Ok(changed)
    }
}
