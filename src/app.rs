use crate::cli::Command;
use chrono::{TimeDelta, Utc};
use mapset::clock::ManualClock;
use mapset::config::Config;
use mapset::source::{load_records, probe_from_str};
use mapset::utils::fmt_duration;
use mapset::{
    Element, InstanceTracker, MapSet, MapSetCache, MapSetDefinition, MapSetStore, MemoryCache,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Module name recorded in the identity of definitions declared on the command line.
const CLI_MODULE: &str = "cli";

pub struct App {
    store: MapSetStore,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let cache: Arc<dyn MapSetCache> = match config.cache_capacity {
            Some(capacity) => Arc::new(MemoryCache::with_capacity(capacity)),
            None => Arc::new(MemoryCache::new()),
        };
        let store = MapSetStore::new(cache, Arc::new(InstanceTracker::new()))
            .with_slow_build_threshold(config.slow_build_threshold());

        info!(
            cache_capacity = ?config.cache_capacity,
            slow_build = fmt_duration(config.slow_build_threshold()),
            "map-set store ready"
        );
        Self { store }
    }

    pub fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Render { records, name, key } => {
                let key = key.unwrap_or_else(|| name.clone());
                let map_set = self.build(&records, &name, &key)?;
                println!("{}", map_set.to_dom().to_xml_string());
            }
            Command::Lookup {
                records,
                name,
                value,
            } => {
                let map_set = self.build(&records, &name, &name)?;
                print_lookup(&map_set, &value);
            }
            Command::RefreshDemo => refresh_demo()?,
        }
        Ok(())
    }

    fn build(&self, records: &Path, name: &str, key: &str) -> anyhow::Result<Arc<MapSet>> {
        let definition = Arc::new(MapSetDefinition::fixed(CLI_MODULE, name));
        let map_set = self
            .store
            .get_or_build(&definition, key, || load_records(records))?;
        info!(
            map_set = map_set.map_set_name(),
            entries = map_set.entries().len(),
            summary = %self.store.describe(&map_set),
            "map set built"
        );
        Ok(map_set)
    }
}

fn print_lookup(map_set: &MapSet, raw: &str) {
    let probe = probe_from_str(raw);
    match map_set.index_of(&probe) {
        Some(index) => println!("index: {index}"),
        None => println!("index: -1"),
    }
    println!("key: {:?}", map_set.key_for(&probe));
    match map_set.key_for_data_string(raw) {
        Some("") => println!("key for data string: (no match)"),
        Some(key) => println!("key for data string: {key:?}"),
        None => println!("key for data string: unsupported for structured map sets"),
    }
}

fn demo_records(prefix: &str) -> Element {
    let mut map_set = Element::new("map-set");
    for (key, data) in [("Yes", "Y"), ("No", "N")] {
        map_set.push_child(
            Element::new("rec")
                .with_child(Element::leaf("key", format!("{prefix}{key}")))
                .with_child(Element::leaf("data", data)),
        );
    }
    Element::new("map-set-list").with_child(map_set)
}

/// Walk through the refresh policy with a manual clock, then bulk-evict one
/// definition while leaving another cached.
fn refresh_demo() -> anyhow::Result<()> {
    let clock = ManualClock::new(Utc::now());
    let cache = Arc::new(MemoryCache::new());
    let store = MapSetStore::with_clock(
        cache.clone(),
        Arc::new(InstanceTracker::new()),
        Arc::new(clock.clone()),
    );

    let definitions = [
        MapSetDefinition::fixed("demo", "static"),
        MapSetDefinition::dynamic("demo", "always", 0),
        MapSetDefinition::dynamic("demo", "five-minutes", 5),
    ];
    let instances = definitions
        .into_iter()
        .map(|def| {
            let key = def.local_name().to_owned();
            store.create_from_dom(&demo_records(""), Arc::new(def), &key)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for minutes in [0, 4, 6] {
        for map_set in &instances {
            println!(
                "+{minutes}m {:<14} refresh required: {}",
                map_set.map_set_name(),
                store.is_refresh_required(map_set)
            );
        }
        clock.advance(TimeDelta::minutes(if minutes == 0 { 4 } else { 2 }));
    }
    for map_set in &instances {
        println!("{}", store.describe(map_set));
    }

    let d = Arc::new(MapSetDefinition::dynamic("demo", "D", 5));
    let e = Arc::new(MapSetDefinition::dynamic("demo", "E", 5));
    for (def, key) in [(&d, "k1"), (&d, "k2"), (&d, "k3"), (&e, "k4")] {
        let map_set = store.create_from_dom(&demo_records(key), Arc::clone(def), key)?;
        store.add_to_cache(map_set)?;
    }
    let evicted = store.refresh_map_sets(&d);
    println!("bulk refresh of D evicted {evicted} map sets");
    for key in ["k1", "k2", "k3", "k4"] {
        println!("{key} cached: {}", cache.contains_key(key));
    }
    Ok(())
}
