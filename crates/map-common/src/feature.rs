//! Tagged geographic features.

use crate::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One or more values recorded for a single tag key.
///
/// OpenStreetMap encodes several values for one key as `a;b`. Classification
/// only ever looks at the first value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Single(String),
    Multi(Vec<String>),
}

impl TagValue {
    /// Split a raw OSM value on `;` into one or more values.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(';') {
            let values: Vec<String> = raw
                .split(';')
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            match values.len() {
                0 => TagValue::Single(String::new()),
                1 => TagValue::Single(values.into_iter().next().unwrap_or_default()),
                _ => TagValue::Multi(values),
            }
        } else {
            TagValue::Single(raw.to_string())
        }
    }

    /// The value used for classification.
    pub fn first(&self) -> Option<&str> {
        match self {
            TagValue::Single(v) => Some(v.as_str()),
            TagValue::Multi(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            TagValue::Single(v) => vec![v.as_str()],
            TagValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Single(v.to_string())
    }
}

/// Tag-name to tag-value mapping.
pub type Tags = BTreeMap<String, TagValue>;

/// A single geographic object: geometry plus tags.
///
/// Immutable once fetched; `id` keeps the source identifier for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub geometry: Geometry,
    #[serde(default)]
    pub tags: Tags,
}

impl Feature {
    pub fn new(id: i64, geometry: Geometry, tags: Tags) -> Self {
        Self { id, geometry, tags }
    }

    /// Builder-style tag insertion, used when assembling features by hand.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), TagValue::parse(value));
        self
    }

    /// First value of a tag, if present and non-empty.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .and_then(TagValue::first)
            .filter(|v| !v.is_empty())
    }

    /// Whether the first value of `key` (case-insensitive) is one of `values`.
    pub fn tag_in(&self, key: &str, values: &[&str]) -> bool {
        self.tag(key)
            .map(|v| {
                let v = v.trim().to_lowercase();
                values.iter().any(|candidate| *candidate == v)
            })
            .unwrap_or(false)
    }
}
