//! String-keyed store for built map sets.
//!
//! The store only holds values; freshness is decided by each `MapSet`. Values
//! are replaced wholesale on `put` and never mutated in place.

use crate::error::CacheError;
use crate::mapset::MapSet;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

pub trait MapSetCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<MapSet>>;

    fn put(&self, key: String, value: Arc<MapSet>) -> Result<(), CacheError>;

    /// Remove `key`. Evicting an absent key is a no-op.
    fn evict(&self, key: &str);
}

/// In-process cache backed by a `DashMap`.
///
/// With a capacity set, puts for new keys are rejected once the cache is full;
/// overwriting an existing key always succeeds. A slot is reserved in `len`
/// while the key's entry guard is held, so the limit holds under concurrent puts.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Arc<MapSet>>>,
    /// occupied slots, updated only under the affected key's entry guard
    len: Arc<AtomicUsize>,
    capacity: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(capacity)),
            len: Arc::new(AtomicUsize::new(0)),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Claim a slot for a new key, failing once `capacity` slots are taken.
    fn reserve(&self) -> Result<(), CacheError> {
        let Some(capacity) = self.capacity else {
            self.len.fetch_add(1, Ordering::AcqRel);
            return Ok(());
        };
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| CacheError::Full { capacity })
    }
}

impl MapSetCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<MapSet>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn put(&self, key: String, value: Arc<MapSet>) -> Result<(), CacheError> {
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                trace!(key = slot.key().as_str(), "map-set cache replace");
                slot.insert(value);
            }
            Entry::Vacant(slot) => {
                self.reserve()?;
                trace!(key = slot.key().as_str(), "map-set cache put");
                slot.insert(value);
            }
        }
        Ok(())
    }

    fn evict(&self, key: &str) {
        if let Entry::Occupied(slot) = self.entries.entry(key.to_owned()) {
            slot.remove();
            self.len.fetch_sub(1, Ordering::AcqRel);
            trace!(key, "map-set cache evict");
        }
    }
}
