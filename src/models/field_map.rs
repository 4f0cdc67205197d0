//! Typed field map for one document's extracted or expected values.
//!
//! Extraction output and expected-data files are flat JSON objects. On the
//! way in, each key is sorted into one of three places:
//! - a known vocabulary key → `known`
//! - the reserved `"error"` key → `error` (extraction failure marker)
//! - anything else → `extras`
//!
//! Key presence is tracked separately from null: `{"VIH": null}` has the
//! `VIH` key present with a `Null` value, which matters for missing/extra
//! field classification.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::field::FieldKey;
use super::value::FieldValue;

/// JSON key reserved for the extraction failure marker.
pub const ERROR_KEY: &str = "error";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    known: BTreeMap<FieldKey, FieldValue>,
    extras: BTreeMap<String, FieldValue>,
    error: Option<String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map carrying only an extraction failure marker.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<FieldValue>) {
        self.known.insert(key, value.into());
    }

    /// Insert by raw name, routing to the known vocabulary, the error
    /// marker or the extras side-channel.
    pub fn insert_raw(&mut self, name: &str, value: FieldValue) {
        if name == ERROR_KEY {
            self.error = Some(match value {
                FieldValue::Text(s) => s,
                other => other.to_cell_text(),
            });
        } else if let Some(key) = FieldKey::from_str(name) {
            self.known.insert(key, value);
        } else {
            self.extras.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.known.get(&key)
    }

    /// Lookup by raw name across known and extra fields.
    pub fn get_raw(&self, name: &str) -> Option<&FieldValue> {
        match FieldKey::from_str(name) {
            Some(key) => self.known.get(&key),
            None => self.extras.get(name),
        }
    }

    /// Text value of a known field, trimmed, or `None` if absent, null or blank.
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        self.get(key)
            .and_then(FieldValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn extras(&self) -> &BTreeMap<String, FieldValue> {
        &self.extras
    }

    /// Field names present in the map, excluding the error marker.
    /// Known keys come first in vocabulary order, extras after in name order.
    pub fn field_names(&self) -> Vec<String> {
        self.known
            .keys()
            .map(|k| k.as_str().to_string())
            .chain(self.extras.keys().cloned())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_raw(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.extras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut map = Self::new();
        for (name, value) in object {
            map.insert_raw(name, FieldValue::from_json(value));
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.len() + usize::from(self.error.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.known {
            map.serialize_entry(key.as_str(), value)?;
        }
        for (name, value) in &self.extras {
            map.serialize_entry(name, value)?;
        }
        if let Some(ref error) = self.error {
            map.serialize_entry(ERROR_KEY, error)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(object) => Ok(Self::from_json_object(&object)),
            other => Err(de::Error::custom(format!(
                "expected a JSON object of fields, found {other}"
            ))),
        }
    }
}
