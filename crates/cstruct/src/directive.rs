//! Directives carried in a declaration list next to the fields.
//!
//! - [cinit] sets a dotted field path to a fixed value on every new instance.
//! - [cenum] attaches labels to a field's raw values for [crate::render::render].

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    panic::Location,
    sync::Arc,
};

use crate::{field::Decl, value::Value};

/// Default value applied to `path` every time the owning type is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub path: Vec<String>,
    pub value: Value,
    /// Where the directive was written, for error messages.
    pub origin: String,
}

impl DefaultValue {
    #[track_caller]
    pub fn new(path: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        let caller = Location::caller();
        let origin = format!(
            "cinit('{}', {}) at {}[line {}]",
            path,
            value,
            caller.file(),
            caller.line()
        );

        Self {
            path: split_path(path),
            value,
            origin,
        }
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.trim_matches(|c: char| c == '.' || c.is_whitespace())
        .split('.')
        .map(|segment| segment.trim().to_string())
        .collect()
}

/// Source of the labels shown next to a field's raw value.
#[derive(Clone)]
pub enum Labels {
    Map(HashMap<i64, String>),
    Func(Arc<dyn Fn(i64) -> String + Send + Sync>),
}

impl Labels {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(i64) -> String + Send + Sync + 'static,
    {
        Labels::Func(Arc::new(f))
    }

    /// Label for `raw`; mapping misses yield `_UNKNOWN_`.
    pub fn label(&self, raw: i64) -> String {
        match self {
            Labels::Map(map) => map
                .get(&raw)
                .cloned()
                .unwrap_or_else(|| "_UNKNOWN_".to_string()),
            Labels::Func(f) => f(raw),
        }
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Labels::Map(map) => f.debug_tuple("Map").field(&BTreeMap::from_iter(map)).finish(),
            Labels::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<HashMap<i64, String>> for Labels {
    fn from(map: HashMap<i64, String>) -> Self {
        Labels::Map(map)
    }
}

impl From<BTreeMap<i64, String>> for Labels {
    fn from(map: BTreeMap<i64, String>) -> Self {
        Labels::Map(map.into_iter().collect())
    }
}

impl<S: Into<String>, const N: usize> From<[(i64, S); N]> for Labels {
    fn from(entries: [(i64, S); N]) -> Self {
        Labels::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Labels from a JSON object keyed by the raw value, e.g. `{"0": "Zero", "1": "One"}`.
#[cfg(feature = "serde")]
impl TryFrom<serde_json::Value> for Labels {
    type Error = crate::errors::SchemaError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let bad = |what: &str| {
            crate::errors::SchemaError::Configuration(format!(
                "labels must be an object of integer keys to strings: {}",
                what
            ))
        };

        let entries = match value {
            serde_json::Value::Object(entries) => entries,
            other => return Err(bad(&other.to_string())),
        };

        entries
            .into_iter()
            .map(|(key, label)| {
                let raw = key.trim().parse::<i64>().map_err(|_| bad(&key))?;
                match label {
                    serde_json::Value::String(label) => Ok((raw, label)),
                    other => Err(bad(&other.to_string())),
                }
            })
            .collect::<Result<HashMap<_, _>, _>>()
            .map(Labels::Map)
    }
}

/// Render-time labels for the field named `field`.
#[derive(Debug, Clone)]
pub struct EnumLabel {
    pub field: String,
    pub labels: Labels,
    pub origin: String,
}

impl EnumLabel {
    #[track_caller]
    pub fn new(field: &str, labels: impl Into<Labels>) -> Self {
        let labels = labels.into();
        let caller = Location::caller();
        let origin = format!(
            "cenum('{}', {:?}) at {}[line {}]",
            field,
            labels,
            caller.file(),
            caller.line()
        );

        Self {
            field: field
                .trim_matches(|c: char| c == '.' || c.is_whitespace())
                .to_string(),
            labels,
            origin,
        }
    }
}

/// Declares a default value for a dotted field path, e.g. `cinit("c.cs.c0", 2)`.
#[track_caller]
pub fn cinit(path: &str, value: impl Into<Value>) -> Decl {
    Decl::Default(DefaultValue::new(path, value))
}

/// Declares labels for a field, from a map (`[(0, "Zero"), (1, "One")]`) or [Labels::func].
#[track_caller]
pub fn cenum(field: &str, labels: impl Into<Labels>) -> Decl {
    Decl::Enum(EnumLabel::new(field, labels))
}
