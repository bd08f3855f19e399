//! Minimal element tree used as both the source shape of a map set and its
//! rendered form.
//!
//! Only what map sets need is modelled: named elements with ordered attributes,
//! text, and child elements. Comments, namespaces, and processing instructions
//! have no meaning here.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::Write as _;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A named element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

/// A path step resolved to something other than exactly one element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected exactly one <{child}> under <{parent}>, found {found}")]
pub struct Cardinality {
    pub parent: String,
    pub child: String,
    pub found: usize,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for an element holding a single text value.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a text node. Empty text adds nothing, so `leaf(name, "")` is an
    /// empty element.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// The same content under a different element name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// True when the element carries no child elements, i.e. it is a plain value.
    pub fn is_simple_element(&self) -> bool {
        self.child_elements().next().is_none()
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Resolve exactly one child element named `name`.
    pub fn get_1e(&self, name: &str) -> Result<&Element, Cardinality> {
        let mut matches = self.child_elements().filter(|el| el.name == name);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only),
            (first, _) => Err(Cardinality {
                parent: self.name.clone(),
                child: name.to_owned(),
                found: if first.is_none() {
                    0
                } else {
                    2 + matches.count()
                },
            }),
        }
    }

    /// All descendants reached by a `/`-separated child path, in document order.
    pub fn get_ul(&self, path: &str) -> Vec<&Element> {
        let mut current: Vec<&Element> = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|el| el.child_elements().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// Whether this element's content equals `probe`'s content or is a
    /// structural superset of it.
    ///
    /// Root element names are not compared. Every attribute and child element
    /// of the probe must be present on the receiver; anything extra on the
    /// receiver is ignored. The relation is one-directional.
    pub fn content_equals_or_superset_of(&self, probe: &Element) -> bool {
        let attrs_covered = probe
            .attributes
            .iter()
            .all(|(k, v)| self.attributes.get(k) == Some(v));
        if !attrs_covered {
            return false;
        }

        if probe.is_simple_element() {
            return self.is_simple_element() && self.text().trim() == probe.text().trim();
        }

        // Each probe child claims a distinct receiver child (first fit).
        let candidates: Vec<&Element> = self.child_elements().collect();
        let mut claimed = vec![false; candidates.len()];
        probe.child_elements().all(|wanted| {
            let hit = candidates.iter().enumerate().position(|(i, have)| {
                !claimed[i] && have.name == wanted.name && have.content_equals_or_superset_of(wanted)
            });
            match hit {
                Some(i) => {
                    claimed[i] = true;
                    true
                }
                None => false,
            }
        })
    }

    /// Build an element from a JSON value.
    ///
    /// Scalars become text, `null` an empty element, objects one child per
    /// field. Arrays inside objects repeat the field's element; a top-level
    /// array produces `item` children.
    pub fn from_json(name: impl Into<String>, value: &Value) -> Self {
        let mut el = Element::new(name);
        match value {
            Value::Null => {}
            Value::String(s) => el.children.push(Node::Text(s.clone())),
            Value::Number(n) => el.children.push(Node::Text(n.to_string())),
            Value::Bool(b) => el.children.push(Node::Text(b.to_string())),
            Value::Array(items) => {
                for item in items {
                    el.push_child(Element::from_json("item", item));
                }
            }
            Value::Object(fields) => {
                for (field, v) in fields {
                    match v {
                        Value::Array(items) => {
                            for item in items {
                                el.push_child(Element::from_json(field.as_str(), item));
                            }
                        }
                        other => el.push_child(Element::from_json(field.as_str(), other)),
                    }
                }
            }
        }
        el
    }

    /// Serialise as XML with text and attribute values escaped.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {k}=\"{}\"", html_escape::encode_double_quoted_attribute(v));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_xml(out),
                Node::Text(t) => out.push_str(&html_escape::encode_text(t)),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}
