//! The two content representations of a map set.
//!
//! Scalar sets hold a plain string per entry and keep a reverse index for
//! data-string lookups. Structured sets hold a sub-tree per entry and match
//! probes by content containment, so a reverse string lookup has no meaning.

use super::entry::{EntryData, FieldOption, MapSetEntry};
use crate::dom::Element;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum MapSetValue {
    Scalar(ScalarValues),
    Structured(StructuredValues),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValues {
    entries: Vec<MapSetEntry>,
    /// data string → position of its first entry
    by_data: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredValues {
    entries: Vec<MapSetEntry>,
}

impl ScalarValues {
    pub(crate) fn new(records: impl IntoIterator<Item = (String, String)>) -> Self {
        let entries: Vec<MapSetEntry> = records
            .into_iter()
            .map(|(key, data)| MapSetEntry {
                key,
                data: EntryData::Scalar(data),
            })
            .collect();

        let mut by_data = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let EntryData::Scalar(data) = &entry.data {
                by_data.entry(data.clone()).or_insert(i);
            }
        }
        Self { entries, by_data }
    }

    fn index_of_str(&self, data: &str) -> Option<usize> {
        self.by_data.get(data).copied()
    }
}

impl StructuredValues {
    pub(crate) fn new(records: impl IntoIterator<Item = (String, Element)>) -> Self {
        Self {
            entries: records
                .into_iter()
                .map(|(key, data)| MapSetEntry {
                    key,
                    data: EntryData::Structured(data),
                })
                .collect(),
        }
    }
}

impl MapSetValue {
    pub fn entries(&self) -> &[MapSetEntry] {
        match self {
            MapSetValue::Scalar(v) => &v.entries,
            MapSetValue::Structured(v) => &v.entries,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, MapSetValue::Scalar(_))
    }

    /// Position of the first entry matching `probe`.
    pub fn index_of(&self, probe: &Element) -> Option<usize> {
        match self {
            MapSetValue::Scalar(v) => v.index_of_str(&probe.text()),
            MapSetValue::Structured(v) => v.entries.iter().position(|entry| {
                entry
                    .data
                    .as_element()
                    .is_some_and(|data| data.content_equals_or_superset_of(probe))
            }),
        }
    }

    /// Key for a raw data string. `None` when the representation cannot answer
    /// the question at all; `Some("")` when it can but nothing matched.
    pub fn key_for_data_string(&self, raw: &str) -> Option<&str> {
        match self {
            MapSetValue::Scalar(v) => Some(
                v.index_of_str(raw)
                    .map(|i| v.entries[i].key.as_str())
                    .unwrap_or(""),
            ),
            MapSetValue::Structured(_) => None,
        }
    }

    pub fn field_options(&self) -> Vec<FieldOption> {
        self.entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| FieldOption {
                key: entry.key.clone(),
                external_ref: match &entry.data {
                    EntryData::Scalar(s) => s.clone(),
                    EntryData::Structured(_) => i.to_string(),
                },
            })
            .collect()
    }

    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            MapSetValue::Scalar(_) => "ScalarMapSet",
            MapSetValue::Structured(_) => "StructuredMapSet",
        }
    }
}
