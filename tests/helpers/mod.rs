//! Shared fixtures for map-set integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use mapset::clock::ManualClock;
use mapset::{Element, InstanceTracker, MapSetStore, MemoryCache};
use std::sync::Arc;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap()
}

/// A `rec` element with the given key and data content.
pub fn rec(key: &str, data: Element) -> Element {
    Element::new("rec")
        .with_child(Element::leaf("key", key))
        .with_child(data.renamed("data"))
}

/// Wrap records in the `map-set-list/map-set` envelope.
pub fn map_set_list(recs: impl IntoIterator<Item = Element>) -> Element {
    let mut map_set = Element::new("map-set");
    for r in recs {
        map_set.push_child(r);
    }
    Element::new("map-set-list").with_child(map_set)
}

pub fn scalar_list(pairs: &[(&str, &str)]) -> Element {
    map_set_list(
        pairs
            .iter()
            .map(|(key, data)| rec(key, Element::leaf("data", *data))),
    )
}

pub fn address(line: &str, city: &str) -> Element {
    Element::new("data")
        .with_child(Element::leaf("line", line))
        .with_child(Element::leaf("city", city))
}

pub struct Fixture {
    pub clock: ManualClock,
    pub cache: Arc<MemoryCache>,
    pub store: MapSetStore,
}

/// A store over a fresh cache, tracker, and manual clock set to [`epoch`].
pub fn fixture() -> Fixture {
    let clock = ManualClock::new(epoch());
    let cache = Arc::new(MemoryCache::new());
    let store = MapSetStore::with_clock(
        cache.clone(),
        Arc::new(InstanceTracker::new()),
        Arc::new(clock.clone()),
    );
    Fixture {
        clock,
        cache,
        store,
    }
}
