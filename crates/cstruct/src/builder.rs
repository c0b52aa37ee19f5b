//! Entry points for declaring record types.
//!
//! ```
//! use cstruct::prelude::*;
//!
//! let header = structure(vec![
//!     field("kind", Scalar::U8),
//!     bits("flags", Scalar::U8, 4),
//!     bits("version", Scalar::U8, 4),
//!     cenum("kind", [(0, "Ping"), (1, "Pong")]),
//!     cinit("version", 2),
//! ])
//! .unwrap();
//!
//! let packet = header.instantiate();
//! assert_eq!(packet.as_bytes(), &[0x00, 0x20]);
//! ```

use std::sync::Arc;

use crate::{errors::SchemaError, field::Decl, layout::Kind, record::RecordType};

/// Builds a record type; see [RecordType::build].
pub fn build_type(
    decls: Vec<Decl>,
    kind: Kind,
    anonymous: bool,
) -> Result<Arc<RecordType>, SchemaError> {
    RecordType::build(decls, kind, anonymous)
}

pub fn structure(decls: Vec<Decl>) -> Result<Arc<RecordType>, SchemaError> {
    build_type(decls, Kind::Struct, false)
}

pub fn union(decls: Vec<Decl>) -> Result<Arc<RecordType>, SchemaError> {
    build_type(decls, Kind::Union, false)
}

/// A struct whose members are also reachable directly through the containing record.
pub fn structure_anon(decls: Vec<Decl>) -> Result<Arc<RecordType>, SchemaError> {
    build_type(decls, Kind::Struct, true)
}

/// A union whose members are also reachable directly through the containing record.
pub fn union_anon(decls: Vec<Decl>) -> Result<Arc<RecordType>, SchemaError> {
    build_type(decls, Kind::Union, true)
}
