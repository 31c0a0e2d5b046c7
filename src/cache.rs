//! Bounded cache of materialized message records.
//!
//! Entries are weak: a record stays cached only while some view still holds
//! it, and a dead or evicted entry is simply read again from storage.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::debug;
use lru::LruCache;

use crate::message::{MessageRecord, RecordKey};

/// Default number of records tracked.
pub const DEFAULT_RECORD_CACHE_CAPACITY: usize = 40;

pub struct RecordCache {
    entries: Mutex<LruCache<RecordKey, Weak<MessageRecord>>>,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_CACHE_CAPACITY)
    }
}

impl RecordCache {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<RecordKey, Weak<MessageRecord>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &RecordKey) -> Option<Arc<MessageRecord>> {
        let mut entries = self.entries();
        let record = entries.get(key).and_then(Weak::upgrade);
        if record.is_none() && entries.pop(key).is_some() {
            debug!("[get] dropped dead entry {key}");
        }
        record
    }

    pub fn insert(&self, record: &Arc<MessageRecord>) {
        self.entries().put(record.key(), Arc::downgrade(record));
    }

    /// Cached record, or the result of `load` which is then cached.
    pub fn get_or_load(
        &self,
        key: RecordKey,
        load: impl FnOnce() -> Option<MessageRecord>,
    ) -> Option<Arc<MessageRecord>> {
        if let Some(record) = self.get(&key) {
            return Some(record);
        }
        let record = Arc::new(load()?);
        self.insert(&record);
        Some(record)
    }

    /// Forget everything, e.g. after stored content changed.
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
