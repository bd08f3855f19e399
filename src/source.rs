//! Loading map-set source records from JSON.
//!
//! A record file looks like `{"records": [{"key": "A", "data": "1"}, ...]}`.
//! `data` may be any JSON value; objects and arrays produce structured data.

use crate::dom::Element;
use crate::mapset::{
    DATA_ELEMENT_NAME, KEY_ELEMENT_NAME, MAPSET_ELEMENT_NAME, MAPSET_LIST_ELEMENT_NAME,
    REC_ELEMENT_NAME,
};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RecordFile {
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    key: String,
    data: serde_json::Value,
}

/// Parse a JSON record file into a `map-set-list` tree.
pub fn records_from_json(json: &str) -> anyhow::Result<Element> {
    let file: RecordFile = serde_json::from_str(json).context("Failed to parse record file")?;
    let mut map_set = Element::new(MAPSET_ELEMENT_NAME);
    for record in &file.records {
        map_set.push_child(
            Element::new(REC_ELEMENT_NAME)
                .with_child(Element::leaf(KEY_ELEMENT_NAME, record.key.as_str()))
                .with_child(Element::from_json(DATA_ELEMENT_NAME, &record.data)),
        );
    }
    Ok(Element::new(MAPSET_LIST_ELEMENT_NAME).with_child(map_set))
}

pub fn load_records(path: &Path) -> anyhow::Result<Element> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    records_from_json(&json).with_context(|| format!("Invalid record file {}", path.display()))
}

/// Parse a lookup probe: JSON objects become structured probes, anything else
/// is taken as a plain string value.
pub fn probe_from_str(raw: &str) -> Element {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ serde_json::Value::Object(_)) => Element::from_json("probe", &value),
        _ => Element::leaf("probe", raw),
    }
}
