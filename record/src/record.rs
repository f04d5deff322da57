//! FILENAME: record/src/record.rs
//! PURPOSE: An ordered field-name → value mapping representing one source row.
//!
//! Field sets are not uniform across rows, so `Record` behaves like a small
//! ordered map: reads of absent fields return null instead of failing, and
//! insertion order is preserved so downstream output stays deterministic.
//! Storage is a Vec of entries plus a hash index over field names, the same
//! two-sided layout used for value interning elsewhere in the workspace.

use rustc_hash::FxHashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::FieldValue;

static NULL: FieldValue = FieldValue::Null;

/// One source row: an ordered mapping from field name to scalar value.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, FieldValue)>,
    index: FxHashMap<String, usize>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
        }
    }

    /// Number of fields in this record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a field. Absent fields read as `None`.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.index.get(field).map(|&i| &self.entries[i].1)
    }

    /// Looks up a field, treating absent fields as null.
    pub fn get_or_null(&self, field: &str) -> &FieldValue {
        self.get(field).unwrap_or(&NULL)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    /// Sets a field, keeping the original position if it already exists and
    /// appending otherwise.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        match self.index.get(&field) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(field.clone(), self.entries.len());
                self.entries.push((field, value));
            }
        }
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Builds a record from a JSON object. Returns `None` for any other JSON
    /// shape — malformed rows are skipped, never an error.
    pub fn from_json(value: &serde_json::Value) -> Option<Record> {
        let obj = value.as_object()?;
        let mut record = Record::with_capacity(obj.len());
        for (key, val) in obj {
            record.set(key.clone(), FieldValue::from_json(val));
        }
        Some(record)
    }

    /// Converts this record back into a JSON object, preserving field order
    /// as far as the JSON map implementation allows.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.entries.len());
        for (key, val) in &self.entries {
            map.insert(key.clone(), val.to_json());
        }
        serde_json::Value::Object(map)
    }
}

/// Builds records from a JSON array, skipping non-object elements.
/// Any non-array input produces an empty list.
pub fn records_from_json(value: &serde_json::Value) -> Vec<Record> {
    match value.as_array() {
        Some(items) => items.iter().filter_map(Record::from_json).collect(),
        None => Vec::new(),
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, val) in &self.entries {
            map.serialize_entry(key, val)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
                    record.set(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
