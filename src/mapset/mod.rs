//! Immutable map-set instances.
//!
//! A `MapSet` binds one content snapshot to the definition it came from and the
//! cache key it lives under. Content never changes after construction; a
//! refresh always builds a new instance, so a cached `Arc<MapSet>` can be read
//! from any number of threads without locking.

mod entry;
mod value;

pub use entry::{EntryData, FieldOption, MapSetEntry};
pub use value::{MapSetValue, ScalarValues, StructuredValues};

use crate::definition::MapSetDefinition;
use crate::dom::Element;
use crate::error::MapSetError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

pub const MAPSET_LIST_ELEMENT_NAME: &str = "map-set-list";
pub const MAPSET_ELEMENT_NAME: &str = "map-set";
pub const REC_ELEMENT_NAME: &str = "rec";
pub const KEY_ELEMENT_NAME: &str = "key";
pub const DATA_ELEMENT_NAME: &str = "data";

#[derive(Debug, Clone)]
pub struct MapSet {
    definition: Arc<MapSetDefinition>,
    evaluated_cache_key: String,
    created_at: DateTime<Utc>,
    value: MapSetValue,
}

impl MapSet {
    /// Build from a `map-set-list` tree holding `map-set/rec` records, each with
    /// exactly one `key` and one `data` child.
    ///
    /// The set is scalar when every record's data is a plain value and
    /// structured otherwise. Every record is resolved before that decision.
    pub fn create_from_dom(
        dom: &Element,
        definition: Arc<MapSetDefinition>,
        evaluated_cache_key: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MapSetError> {
        let recs = dom.get_ul(&format!("{MAPSET_ELEMENT_NAME}/{REC_ELEMENT_NAME}"));
        Self::create_from_records(&recs, definition, evaluated_cache_key, created_at)
    }

    /// Build from an ordered list of `rec` elements.
    pub fn create_from_records(
        recs: &[&Element],
        definition: Arc<MapSetDefinition>,
        evaluated_cache_key: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MapSetError> {
        let construction = |reason, source| MapSetError::Construction {
            map_set: definition.local_name().to_owned(),
            reason,
            source,
        };

        let mut resolved = Vec::with_capacity(recs.len());
        for rec in recs {
            let data = rec
                .get_1e(DATA_ELEMENT_NAME)
                .map_err(|e| construction("failed to resolve 'data' element", e))?;
            let key = rec
                .get_1e(KEY_ELEMENT_NAME)
                .map_err(|e| construction("failed to resolve 'key' element", e))?;
            resolved.push((key.text(), data));
        }

        let value = if resolved.iter().all(|(_, data)| data.is_simple_element()) {
            MapSetValue::Scalar(ScalarValues::new(
                resolved.into_iter().map(|(key, data)| (key, data.text())),
            ))
        } else {
            MapSetValue::Structured(StructuredValues::new(
                resolved.into_iter().map(|(key, data)| (key, data.clone())),
            ))
        };

        Ok(Self::from_value(definition, evaluated_cache_key, created_at, value))
    }

    pub fn from_value(
        definition: Arc<MapSetDefinition>,
        evaluated_cache_key: impl Into<String>,
        created_at: DateTime<Utc>,
        value: MapSetValue,
    ) -> Self {
        Self {
            definition,
            evaluated_cache_key: evaluated_cache_key.into(),
            created_at,
            value,
        }
    }

    /// Name of this map set as declared in its module.
    pub fn map_set_name(&self) -> &str {
        self.definition.local_name()
    }

    pub fn is_dynamic(&self) -> bool {
        self.definition.is_dynamic()
    }

    /// Whether this instance should be rebuilt as of `now`.
    ///
    /// Static sets never need a refresh. Dynamic sets with a zero timeout always
    /// do; otherwise only once more than the timeout has elapsed since creation.
    pub fn is_refresh_required_at(&self, now: DateTime<Utc>) -> bool {
        if !self.definition.is_dynamic() {
            return false;
        }
        if self.definition.refresh_timeout_mins == 0 {
            return true;
        }
        now - self.created_at > self.definition.refresh_timeout()
    }

    pub fn is_refresh_required(&self) -> bool {
        self.is_refresh_required_at(Utc::now())
    }

    /// Render as `map-set-list/map-set/rec/{key | data}`. Built on every call.
    pub fn to_dom(&self) -> Element {
        let mut map_set = Element::new(MAPSET_ELEMENT_NAME);
        for entry in self.value.entries() {
            let data = match &entry.data {
                EntryData::Scalar(s) => Element::leaf(DATA_ELEMENT_NAME, s.as_str()),
                EntryData::Structured(el) => el.clone().renamed(DATA_ELEMENT_NAME),
            };
            map_set.push_child(
                Element::new(REC_ELEMENT_NAME)
                    .with_child(Element::leaf(KEY_ELEMENT_NAME, entry.key.as_str()))
                    .with_child(data),
            );
        }
        Element::new(MAPSET_LIST_ELEMENT_NAME).with_child(map_set)
    }

    /// Position of `probe` within this set, by string value for scalar sets and
    /// by content containment for structured ones.
    pub fn index_of(&self, probe: &Element) -> Option<usize> {
        self.value.index_of(probe)
    }

    pub fn field_options(&self) -> Vec<FieldOption> {
        self.value.field_options()
    }

    pub fn entries(&self) -> &[MapSetEntry] {
        self.value.entries()
    }

    pub fn contains_data(&self, probe: &Element) -> bool {
        self.index_of(probe).is_some()
    }

    /// Key of the entry matching `probe`, or an empty string.
    pub fn key_for(&self, probe: &Element) -> &str {
        self.index_of(probe)
            .map(|i| self.entries()[i].key())
            .unwrap_or("")
    }

    /// Key for a raw data string.
    ///
    /// Scalar sets answer `Some(key)` or `Some("")` when nothing matches.
    /// Structured sets always answer `None`: the lookup is not supported there,
    /// which callers must not read as "not found".
    pub fn key_for_data_string(&self, raw: &str) -> Option<&str> {
        self.value.key_for_data_string(raw)
    }

    pub fn value(&self) -> &MapSetValue {
        &self.value
    }

    pub fn definition(&self) -> &Arc<MapSetDefinition> {
        &self.definition
    }

    pub fn evaluated_cache_key(&self) -> &str {
        &self.evaluated_cache_key
    }

    pub fn summary_at(&self, now: DateTime<Utc>) -> MapSetSummary<'_> {
        MapSetSummary { map_set: self, now }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One-line description of a map set, with its age measured at a given time.
pub struct MapSetSummary<'a> {
    map_set: &'a MapSet,
    now: DateTime<Utc>,
}

impl fmt::Display for MapSetSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map_set = self.map_set;
        write!(
            f,
            "{} CacheKey: {} LifetimeMins: {} TimeoutMins: {} IsDynamic: {}",
            map_set.value.variant_name(),
            map_set.evaluated_cache_key,
            (self.now - map_set.created_at).num_minutes(),
            map_set.definition.refresh_timeout_mins,
            map_set.is_dynamic()
        )
    }
}

/// Ages against the system clock; use `summary_at` with an injected clock.
impl fmt::Display for MapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.summary_at(Utc::now()), f)
    }
}
