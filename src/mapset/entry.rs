use crate::dom::Element;

/// A single key/data record within a map set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSetEntry {
    pub(crate) key: String,
    pub(crate) data: EntryData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    Scalar(String),
    Structured(Element),
}

impl MapSetEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> &EntryData {
        &self.data
    }
}

impl EntryData {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryData::Scalar(s) => Some(s),
            EntryData::Structured(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            EntryData::Structured(el) => Some(el),
            EntryData::Scalar(_) => None,
        }
    }
}

/// One selectable option as presented to a form widget.
///
/// `external_ref` is the value posted back when the option is chosen: the data
/// string for scalar map sets, the entry's position for structured ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub key: String,
    pub external_ref: String,
}
