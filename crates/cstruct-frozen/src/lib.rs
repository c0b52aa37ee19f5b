//! # cstruct-frozen
//!
//! Read-only records built from a mapping plus keyword-style overrides.
//!
//! A [FrozenRecord] keeps its fields in insertion order for iteration but compares
//! equal to any record holding the same fields and values, whatever their order.
//!
//! ```
//! use cstruct::Value;
//! use cstruct_frozen::FrozenRecord;
//!
//! let m = FrozenRecord::new([("a", 1u8), ("b", 2u8)], [("c", 3u8), ("d", 4u8)]);
//! let n = FrozenRecord::new([("d", 4u8), ("b", 2u8)], [("c", 3u8), ("a", 1u8)]);
//!
//! assert_eq!(m, n);
//! assert_eq!(m.get("c"), Some(&Value::U64(3)));
//! assert!(m.try_set("a", 5u8).is_err());
//! ```

use std::fmt;

use cstruct::{Instance, Map, Value};
use indexmap::IndexMap;

mod errors;

pub use errors::FrozenError;

/// Immutable named values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrozenRecord {
    fields: IndexMap<String, Value>,
}

impl FrozenRecord {
    /// Builds a record from `fields`, then applies `overrides` on top.
    pub fn new<K, V, F, O>(fields: F, overrides: O) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        F: IntoIterator<Item = (K, V)>,
        O: IntoIterator<Item = (K, V)>,
    {
        let fields = fields
            .into_iter()
            .chain(overrides)
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { fields }
    }

    /// Snapshot of a mapping value; anything else gives an empty record.
    pub fn from_value(value: &Value) -> Self {
        let fields = value.as_map().cloned().unwrap_or_default();
        Self { fields }
    }

    /// Snapshot of an instance's [Instance::to_dict] mapping.
    pub fn from_instance(instance: &Instance) -> Self {
        Self {
            fields: instance.to_dict(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Like [FrozenRecord::get], but a missing field is an error.
    pub fn require(&self, name: &str) -> Result<&Value, FrozenError> {
        self.fields
            .get(name)
            .ok_or_else(|| FrozenError::MissingField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Always fails: frozen fields cannot be assigned.
    pub fn try_set(&self, name: &str, value: impl Into<Value>) -> Result<(), FrozenError> {
        Err(FrozenError::Assignment {
            field: name.to_string(),
            value: value.into().to_string(),
            record: self.to_string(),
        })
    }

    pub fn into_map(self) -> Map {
        self.fields
    }
}

impl From<Map> for FrozenRecord {
    fn from(fields: Map) -> Self {
        Self { fields }
    }
}

impl From<FrozenRecord> for Value {
    fn from(record: FrozenRecord) -> Self {
        Value::Map(record.fields)
    }
}

impl<'a> IntoIterator for &'a FrozenRecord {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for FrozenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Map(self.fields.clone()))
    }
}
