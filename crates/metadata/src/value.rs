//! Variant-valued entries for the open `extra_metadata` mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured value stored under a free-form metadata key.
///
/// Serialized untagged, so the file holds plain JSON strings, numbers,
/// arrays and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
    NumberList(Vec<f64>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Build a nested map from `(key, value)` pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<MetadataValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            Self::NumberList(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MetadataValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key inside a `Map` value
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// False if any number in this value (nested ones included) is NaN or
    /// infinite. JSON has no encoding for those.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Number(n) => n.is_finite(),
            Self::Text(_) => true,
            Self::NumberList(values) => values.iter().all(|v| v.is_finite()),
            Self::Map(map) => map.values().all(MetadataValue::is_finite),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<f64>> for MetadataValue {
    fn from(values: Vec<f64>) -> Self {
        Self::NumberList(values)
    }
}

impl From<&[f64]> for MetadataValue {
    fn from(values: &[f64]) -> Self {
        Self::NumberList(values.to_vec())
    }
}

impl From<BTreeMap<String, MetadataValue>> for MetadataValue {
    fn from(map: BTreeMap<String, MetadataValue>) -> Self {
        Self::Map(map)
    }
}
