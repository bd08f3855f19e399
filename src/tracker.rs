//! Secondary index from map-set definition to the cache keys currently holding
//! one of its instances, so every instance of a definition can be evicted
//! without scanning the cache.
//!
//! Each definition's key set is only touched while its `DashMap` entry guard is
//! held. Registration performs the cache write under that guard and bulk
//! refresh evicts under it, so a key can never be live in the cache while
//! missing from its definition's set.
//!
//! Key sets are dropped on refresh but otherwise only grow; definitions that
//! are never refreshed keep their keys for the tracker's lifetime.

use crate::cache::MapSetCache;
use crate::definition::{DefinitionId, MapSetDefinition};
use crate::mapset::MapSet;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct InstanceTracker {
    /// definition → evaluated cache keys
    keys: DashMap<DefinitionId, HashSet<String>>,
}

impl InstanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `map_set`'s cache key against its definition.
    pub fn add_map_set(&self, map_set: &MapSet) {
        self.keys
            .entry(map_set.definition().id.clone())
            .or_default()
            .insert(map_set.evaluated_cache_key().to_owned());
    }

    /// Run `write` under the definition's guard and record the key only if it
    /// succeeds.
    pub fn register_with<E>(
        &self,
        map_set: &MapSet,
        write: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E> {
        let key = map_set.evaluated_cache_key();
        match self.keys.entry(map_set.definition().id.clone()) {
            Entry::Occupied(mut tracked) => {
                write()?;
                tracked.get_mut().insert(key.to_owned());
            }
            Entry::Vacant(slot) => {
                write()?;
                slot.insert(HashSet::from([key.to_owned()]));
            }
        }
        debug!(
            definition = %map_set.definition().id,
            key,
            "map set registered"
        );
        Ok(())
    }

    /// Evict every tracked instance of `definition` from `cache` and forget
    /// its keys. Returns the number of keys evicted.
    pub fn refresh_map_sets(&self, definition: &MapSetDefinition, cache: &dyn MapSetCache) -> usize {
        let Entry::Occupied(tracked) = self.keys.entry(definition.id.clone()) else {
            debug!(definition = %definition.id, "no tracked map sets to refresh");
            return 0;
        };
        for key in tracked.get() {
            cache.evict(key);
        }
        let (_, keys) = tracked.remove_entry();
        info!(
            definition = %definition.id,
            evicted = keys.len(),
            "map sets refreshed"
        );
        keys.len()
    }

    /// Keys currently tracked for `definition`, sorted.
    pub fn tracked_keys(&self, definition: &DefinitionId) -> Vec<String> {
        let mut keys: Vec<String> = self
            .keys
            .get(definition)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn definition_count(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::CacheError;
    use crate::mapset::{MapSetValue, ScalarValues};
    use chrono::Utc;
    use std::sync::Arc;

    fn instance(def: &Arc<MapSetDefinition>, key: &str) -> Arc<MapSet> {
        Arc::new(MapSet::from_value(
            Arc::clone(def),
            key,
            Utc::now(),
            MapSetValue::Scalar(ScalarValues::new([("A".to_owned(), "1".to_owned())])),
        ))
    }

    fn put(cache: &MemoryCache, map_set: &Arc<MapSet>) -> Result<(), CacheError> {
        cache.put(map_set.evaluated_cache_key().to_owned(), Arc::clone(map_set))
    }

    #[test]
    fn repeated_adds_are_idempotent() {
        let def = Arc::new(MapSetDefinition::dynamic("m", "d", 0));
        let tracker = InstanceTracker::new();
        for _ in 0..5 {
            tracker.add_map_set(&instance(&def, "k1"));
        }
        assert_eq!(tracker.tracked_keys(&def.id), ["k1"]);
    }

    #[test]
    fn failed_write_registers_nothing() {
        let def = Arc::new(MapSetDefinition::fixed("m", "d"));
        let tracker = InstanceTracker::new();
        let result: Result<(), &str> = tracker.register_with(&instance(&def, "k1"), || Err("down"));
        assert_eq!(result, Err("down"));
        assert!(tracker.tracked_keys(&def.id).is_empty());
        assert_eq!(tracker.definition_count(), 0);
    }

    #[test]
    fn refresh_of_untracked_definition_is_noop() {
        let tracker = InstanceTracker::new();
        let cache = MemoryCache::new();
        assert_eq!(tracker.refresh_map_sets(&MapSetDefinition::fixed("m", "none"), &cache), 0);
    }

    #[test]
    fn refresh_tolerates_keys_already_gone_from_cache() {
        let def = Arc::new(MapSetDefinition::fixed("m", "d"));
        let tracker = InstanceTracker::new();
        let cache = MemoryCache::new();
        let map_set = instance(&def, "k1");
        tracker.register_with(&map_set, || put(&cache, &map_set)).unwrap();
        cache.evict("k1");

        assert_eq!(tracker.refresh_map_sets(&def, &cache), 1);
        assert!(tracker.tracked_keys(&def.id).is_empty());
    }

    #[test]
    fn concurrent_register_and_refresh_never_leaves_untracked_keys() {
        let def = Arc::new(MapSetDefinition::dynamic("m", "busy", 0));
        let tracker = InstanceTracker::new();
        let cache = MemoryCache::new();

        std::thread::scope(|s| {
            for t in 0..4 {
                let (def, tracker, cache) = (&def, &tracker, &cache);
                s.spawn(move || {
                    for i in 0..250 {
                        let map_set = instance(def, &format!("k{t}-{}", i % 10));
                        tracker.register_with(&map_set, || put(cache, &map_set)).unwrap();
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..100 {
                    tracker.refresh_map_sets(&def, &cache);
                    std::thread::yield_now();
                }
            });
        });

        let tracked = tracker.tracked_keys(&def.id);
        for t in 0..4 {
            for i in 0..10 {
                let key = format!("k{t}-{i}");
                if cache.contains_key(&key) {
                    assert!(tracked.contains(&key), "{key} cached but not tracked");
                }
            }
        }
    }
}
