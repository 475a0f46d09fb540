//! In-process store backend.
//!
//! Used by the protocol tests, the plugin tests, and the CLI's `--memory`
//! mode. Clones share the same underlying map, so a test can hand one clone
//! to the poller and keep another to play the external verdict writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{AttributeValue, Attributes, RecordKey, ATTR_RESULT};
use crate::traits::CoordinationStore;

#[derive(Debug, Default)]
struct Inner {
    items: Mutex<HashMap<RecordKey, Attributes>>,
    failure: Mutex<Option<StoreError>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// A `CoordinationStore` backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Recover data even if the mutex was poisoned by a panicking test thread.
    fn items(&self) -> MutexGuard<'_, HashMap<RecordKey, Attributes>> {
        self.inner.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn injected_failure(&self) -> Option<StoreError> {
        self.inner
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Make every subsequent `put` and `get` fail with `error`, or restore
    /// normal operation with `None`.
    pub fn set_failure(&self, error: Option<StoreError>) {
        *self.inner.failure.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Write the verdict attribute the way the external actor would.
    ///
    /// `None` writes an explicit null. Creates the item if it does not exist
    /// yet (the external actor may race ahead of the publisher).
    pub fn set_verdict(&self, key: &RecordKey, verdict: Option<&str>) {
        let value = match verdict {
            Some(v) => AttributeValue::string(v),
            None => AttributeValue::Null,
        };
        let mut items = self.items();
        let item = items
            .entry(key.clone())
            .or_insert_with(|| key.to_attributes());
        item.insert(ATTR_RESULT.to_string(), value);
    }

    /// Current contents of the item under `key`, bypassing counters and
    /// injected failures.
    pub fn item(&self, key: &RecordKey) -> Option<Attributes> {
        self.items().get(key).cloned()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `get` calls served (including failed ones).
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of `put` calls served (including failed ones).
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn put(&self, key: &RecordKey, attributes: Attributes) -> Result<(), StoreError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let mut items = self.items();
        let item = items
            .entry(key.clone())
            .or_insert_with(|| key.to_attributes());
        item.extend(attributes);
        item.extend(key.to_attributes());
        tracing::trace!(key = %key, "memory store put");
        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        Ok(self.items().get(key).cloned())
    }
}
