//! Cache-and-refresh front end for map sets.
//!
//! Couples the value cache with the instance tracker so that every cached
//! instance is also indexed by definition, and implements the read path:
//! serve a fresh cached instance, otherwise rebuild once per key and replace.

use crate::cache::MapSetCache;
use crate::clock::{Clock, SystemClock};
use crate::definition::MapSetDefinition;
use crate::dom::Element;
use crate::error::MapSetError;
use crate::mapset::MapSet;
use crate::tracker::InstanceTracker;
use crate::utils::log_if_slow;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const DEFAULT_SLOW_BUILD: Duration = Duration::from_millis(250);

/// Shared map-set store. Clone-cheap (all `Arc`-wrapped internals).
#[derive(Clone)]
pub struct MapSetStore {
    cache: Arc<dyn MapSetCache>,
    tracker: Arc<InstanceTracker>,
    clock: Arc<dyn Clock>,
    /// cache key → build guard, so concurrent misses on one key build once
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
    slow_build: Duration,
}

impl MapSetStore {
    pub fn new(cache: Arc<dyn MapSetCache>, tracker: Arc<InstanceTracker>) -> Self {
        Self::with_clock(cache, tracker, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cache: Arc<dyn MapSetCache>,
        tracker: Arc<InstanceTracker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            tracker,
            clock,
            inflight: Arc::new(DashMap::new()),
            slow_build: DEFAULT_SLOW_BUILD,
        }
    }

    /// Builds slower than `threshold` are logged as warnings.
    pub fn with_slow_build_threshold(mut self, threshold: Duration) -> Self {
        self.slow_build = threshold;
        self
    }

    pub fn tracker(&self) -> &InstanceTracker {
        &self.tracker
    }

    /// Read the instance cached under `key`, fresh or not.
    pub fn get_from_cache(&self, key: &str) -> Option<Arc<MapSet>> {
        self.cache.get(key)
    }

    /// Cache `map_set` under its own key and record it with the tracker. A
    /// rejected cache write leaves the tracker untouched.
    pub fn add_to_cache(&self, map_set: MapSet) -> Result<Arc<MapSet>, MapSetError> {
        let map_set = Arc::new(map_set);
        let key = map_set.evaluated_cache_key().to_owned();
        let written = self
            .tracker
            .register_with(&map_set, || self.cache.put(key.clone(), Arc::clone(&map_set)));
        if let Err(source) = written {
            return Err(MapSetError::CacheWrite { key, source });
        }
        Ok(map_set)
    }

    /// Evict every cached instance of `definition`. The next access rebuilds.
    pub fn refresh_map_sets(&self, definition: &MapSetDefinition) -> usize {
        self.tracker.refresh_map_sets(definition, self.cache.as_ref())
    }

    /// Build an uncached instance from a `map-set-list` tree, stamped with the
    /// store's clock.
    pub fn create_from_dom(
        &self,
        dom: &Element,
        definition: Arc<MapSetDefinition>,
        evaluated_cache_key: &str,
    ) -> Result<MapSet, MapSetError> {
        MapSet::create_from_dom(dom, definition, evaluated_cache_key, self.clock.now())
    }

    pub fn is_refresh_required(&self, map_set: &MapSet) -> bool {
        map_set.is_refresh_required_at(self.clock.now())
    }

    /// Summary line for `map_set`, aged against the store's clock.
    pub fn describe(&self, map_set: &MapSet) -> String {
        map_set.summary_at(self.clock.now()).to_string()
    }

    /// Return the instance cached under `key` if it is still fresh, otherwise
    /// build it from the tree produced by `build` and cache the result.
    ///
    /// Concurrent callers missing on the same key wait for a single build and
    /// then reuse its result, unless the definition demands a rebuild on every
    /// access. The per-key claim is released once no caller is waiting on it.
    pub fn get_or_build<F>(
        &self,
        definition: &Arc<MapSetDefinition>,
        key: &str,
        build: F,
    ) -> Result<Arc<MapSet>, MapSetError>
    where
        F: FnOnce() -> anyhow::Result<Element>,
    {
        if let Some(hit) = self.fresh(key) {
            trace!(key, "map-set cache hit");
            return Ok(hit);
        }

        let slot = self
            .inflight
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _claim = slot.lock().unwrap_or_else(|e| e.into_inner());
        let result = self.build_claimed(definition, key, build);
        // Drop the slot unless another caller is already queued on it.
        self.inflight
            .remove_if(key, |_, queued| Arc::strong_count(queued) <= 2);
        result
    }

    /// Rebuild under a held per-key claim, unless a caller that held the claim
    /// before us already cached a fresh instance.
    fn build_claimed<F>(
        &self,
        definition: &Arc<MapSetDefinition>,
        key: &str,
        build: F,
    ) -> Result<Arc<MapSet>, MapSetError>
    where
        F: FnOnce() -> anyhow::Result<Element>,
    {
        if let Some(hit) = self.fresh(key) {
            debug!(key, "map set built by another caller");
            return Ok(hit);
        }

        debug!(map_set = definition.local_name(), key, "building map set");
        let start = Instant::now();
        let dom = build()?;
        let map_set = self.create_from_dom(&dom, Arc::clone(definition), key)?;
        log_if_slow(start, self.slow_build, definition.local_name(), key);

        self.add_to_cache(map_set)
    }

    fn fresh(&self, key: &str) -> Option<Arc<MapSet>> {
        self.cache
            .get(key)
            .filter(|cached| !self.is_refresh_required(cached))
    }
}
