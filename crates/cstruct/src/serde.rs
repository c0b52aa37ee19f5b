//! JSON-deserializable declaration lists.
//!
//! These types mirror [crate::field::Decl] and [crate::field::FieldType] so that a record
//! type can be shipped as a JSON document and compiled with [RecordType::from_json]:
//!
//! ```json
//! {"kind": "struct", "fields": [
//!     {"decl": "field", "name": "kind", "type": {"kind": "scalar", "scalar": "u8"}},
//!     {"decl": "field", "name": "flags", "type": {"kind": "scalar", "scalar": "u8"}, "bits": 4},
//!     {"decl": "init", "path": "kind", "value": 1},
//!     {"decl": "enum", "field": "kind", "labels": {"0": "Ping", "1": "Pong"}}
//! ]}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    errors::SchemaError,
    field::FieldType,
    record::RecordType,
    scalar::Scalar,
    value::Value,
};

/// One entry of a declaration list.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "decl", rename_all = "lowercase")]
pub enum DeclDef {
    /// A field; an empty or missing name declares a reserved field.
    Field {
        #[serde(default)]
        name: String,
        #[serde(rename = "type")]
        ty: TypeDef,
        /// Bit width for bit-fields.
        #[serde(default)]
        bits: Option<u32>,
    },
    /// Default value for a dotted path.
    Init { path: String, value: Value },
    /// Labels for a field, as an object keyed by the raw integer value.
    Enum {
        field: String,
        labels: serde_json::Value,
    },
}

/// Type of a declared field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDef {
    Scalar { scalar: Scalar },
    Array { count: usize, element: Box<TypeDef> },
    Struct(CompositeDef),
    Union(CompositeDef),
}

/// Body of a struct or union.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompositeDef {
    /// Members are reachable directly through the containing record.
    #[serde(default)]
    pub anonymous: bool,
    pub fields: Vec<DeclDef>,
}

impl RecordType {
    /// Compiles a struct or union described as JSON.
    ///
    /// Malformed JSON and top-level types that are not records are reported as
    /// [SchemaError::Configuration].
    pub fn from_json(json: &str) -> Result<Arc<Self>, SchemaError> {
        let def: TypeDef =
            serde_json::from_str(json).map_err(|e| SchemaError::Configuration(e.to_string()))?;

        match FieldType::try_from(def)? {
            FieldType::Record(record) => Ok(record),
            other => Err(SchemaError::Configuration(format!(
                "expected a struct or union, found {}",
                other.type_name()
            ))),
        }
    }
}
