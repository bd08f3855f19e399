//! Cached, immutable map sets: ordered key/data lookup tables built from a
//! source tree, shared across threads, refreshed by a per-definition policy,
//! and evictable in bulk per definition.

pub mod cache;
pub mod clock;
pub mod config;
pub mod definition;
pub mod dom;
pub mod error;
pub mod mapset;
pub mod source;
pub mod store;
pub mod tracker;
pub mod utils;

pub use cache::{MapSetCache, MemoryCache};
pub use definition::{DefinitionId, MapSetDefinition};
pub use dom::Element;
pub use error::{CacheError, MapSetError};
pub use mapset::MapSet;
pub use store::MapSetStore;
pub use tracker::InstanceTracker;
