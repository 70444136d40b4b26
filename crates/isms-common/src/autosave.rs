//! Periodic Auto-Save
//!
//! Editors hand their latest model to the [`AutoSaver`] on every change; a
//! background task writes it to [`keys::AUTO_SAVE`] on a fixed interval,
//! only when something changed since the last flush.

use crate::error::{StorageError, StorageResult};
use crate::keys;
use crate::store::IsmsStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default auto-save period
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Auto-saved blob
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveRecord {
    /// When the blob was written
    pub saved_at: DateTime<Utc>,
    /// Key of the model the blob belongs to
    pub key: String,
    /// Model snapshot
    pub data: serde_json::Value,
}

impl AutoSaveRecord {
    /// Latest auto-saved blob, if any
    pub fn latest(store: &IsmsStore) -> Option<Self> {
        store.load(keys::AUTO_SAVE)
    }
}

struct AutoSaveState {
    pending: Mutex<Option<(String, serde_json::Value)>>,
    dirty: AtomicBool,
    flushes: AtomicU64,
}

/// Auto-saver (clones share state)
#[derive(Clone)]
pub struct AutoSaver {
    state: Arc<AutoSaveState>,
}

impl AutoSaver {
    /// Create idle auto-saver
    pub fn new() -> Self {
        Self {
            state: Arc::new(AutoSaveState {
                pending: Mutex::new(None),
                dirty: AtomicBool::new(false),
                flushes: AtomicU64::new(0),
            }),
        }
    }

    /// Record latest model for `key` and set the dirty flag
    pub fn mark_dirty<T: Serialize>(&self, key: &str, model: &T) -> StorageResult<()> {
        let value = serde_json::to_value(model).map_err(|e| StorageError::Serialize(e.to_string()))?;
        *self.state.pending.lock() = Some((key.to_string(), value));
        self.state.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Dirty flag
    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::Acquire)
    }

    /// Number of blobs written so far
    pub fn flush_count(&self) -> u64 {
        self.state.flushes.load(Ordering::Relaxed)
    }

    /// Write pending model when dirty; returns whether a write happened
    pub fn flush(&self, store: &IsmsStore) -> StorageResult<bool> {
        if !self.state.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        let Some((key, data)) = self.state.pending.lock().clone() else {
            return Ok(false);
        };

        let record = AutoSaveRecord {
            saved_at: Utc::now(),
            key,
            data,
        };
        if let Err(e) = store.write(keys::AUTO_SAVE, &record) {
            // keep the model pending so the next tick retries it
            self.state.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        self.state.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Auto-saved '{}'", record.key);
        Ok(true)
    }

    /// Start the periodic flush task on the current tokio runtime
    pub fn spawn(&self, store: IsmsStore, period: Duration) -> AutoSaveHandle {
        let saver = self.clone();
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                if let Err(e) = saver.flush(&store) {
                    tracing::warn!("Auto-save failed: {}", e);
                }
            }
        });
        tracing::info!("Auto-save every {:?}", period);
        AutoSaveHandle { task }
    }
}

impl Default for AutoSaver {
    fn default() -> Self {
        Self::new()
    }
}

/// Running auto-save task; dropping it stops the task
pub struct AutoSaveHandle {
    task: JoinHandle<()>,
}

impl AutoSaveHandle {
    /// Stop the task
    pub fn stop(self) {}
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn test_failed_flush_stays_dirty() {
        let store = IsmsStore::new(Arc::new(InMemoryStore::with_quota(10)));
        let saver = AutoSaver::new();
        saver.mark_dirty("isms-risk-assessment", &vec![1, 2, 3]).unwrap();

        let err = saver.flush(&store).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(saver.is_dirty());
        assert_eq!(saver.flush_count(), 0);

        let roomy = IsmsStore::in_memory();
        assert!(saver.flush(&roomy).unwrap());
        assert!(!saver.is_dirty());
        assert_eq!(AutoSaveRecord::latest(&roomy).unwrap().key, "isms-risk-assessment");
    }

    #[test]
    fn test_flush_only_when_dirty() {
        let store = IsmsStore::in_memory();
        let saver = AutoSaver::new();

        assert!(!saver.flush(&store).unwrap());
        assert!(AutoSaveRecord::latest(&store).is_none());

        saver.mark_dirty("isms-risk-assessment", &vec![1, 2, 3]).unwrap();
        assert!(saver.is_dirty());
        assert!(saver.flush(&store).unwrap());
        assert!(!saver.is_dirty());

        // Second flush without changes writes nothing
        assert!(!saver.flush(&store).unwrap());
        assert_eq!(saver.flush_count(), 1);

        let record = AutoSaveRecord::latest(&store).unwrap();
        assert_eq!(record.key, "isms-risk-assessment");
        assert_eq!(record.data, serde_json::json!([1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_flushes_on_interval() {
        let store = IsmsStore::in_memory();
        let saver = AutoSaver::new();
        let handle = saver.spawn(store.clone(), Duration::from_secs(30));

        saver.mark_dirty("k", &"v").unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(saver.flush_count(), 1);

        // Idle interval does not rewrite
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(saver.flush_count(), 1);

        handle.stop();
        saver.mark_dirty("k", &"w").unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(saver.flush_count(), 1);
        assert!(saver.is_dirty());
    }
}
