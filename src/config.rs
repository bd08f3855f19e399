//! Runtime configuration, read from an optional `mapset.toml` and then from
//! `MAPSET_`-prefixed environment variables (which win).

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_FILE: &str = "mapset.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Level for this crate's own log targets (`trace` .. `error`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum number of cached map sets. Unbounded when unset.
    #[serde(default)]
    pub cache_capacity: Option<usize>,
    /// Map-set builds slower than this many milliseconds are logged as warnings.
    #[serde(default = "default_slow_build_ms")]
    pub slow_build_ms: u64,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_slow_build_ms() -> u64 {
    250
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed("MAPSET_")),
        )
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        figment.extract().context("Failed to load config")
    }

    pub fn slow_build_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_build_ms)
    }
}
