//! Error types for building and caching map sets.

use crate::dom::Cardinality;

#[derive(Debug, thiserror::Error)]
pub enum MapSetError {
    #[error("invalid map-set source for '{map_set}': {reason}")]
    Construction {
        map_set: String,
        reason: &'static str,
        #[source]
        source: Cardinality,
    },
    #[error("failed to cache map set under key '{key}'")]
    CacheWrite {
        key: String,
        #[source]
        source: CacheError,
    },
    #[error(transparent)]
    Build(#[from] anyhow::Error),
}

/// Failure reported by a [`MapSetCache`](crate::cache::MapSetCache) write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache is full ({capacity} entries)")]
    Full { capacity: usize },
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}
