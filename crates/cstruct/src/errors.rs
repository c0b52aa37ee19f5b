//! Error types for record building, field access and literal parsing.

/// Errors produced while turning a declaration list into a [crate::record::RecordType].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two fields of one struct/union share a name after whitespace trimming.
    #[error("field name in union/struct conflicts: {0}")]
    DuplicateField(String),
    /// Bit width is zero or wider than the storage type.
    #[error("bit width {width} of field `{field}` does not fit {storage_bits}-bit storage")]
    InvalidBitWidth {
        field: String,
        width: u32,
        storage_bits: u32,
    },
    /// A bit width was attached to an array or record field.
    #[error("bit width on non-scalar field `{0}`")]
    BitFieldOnNonScalar(String),
    /// A directive was built from an unusable description.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A default-value path does not lead to a scalar field.
    #[error("cannot resolve default value {origin}: {reason}")]
    Initialization { origin: String, reason: String },
}

/// Errors produced by path based access on a live [crate::instance::Instance].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// No (non-reserved) field with this name exists at this level.
    #[error("no field named `{0}`")]
    UnknownField(String),
    /// The path ends on an array or record, or indexes into a non-array.
    #[error("`{0}` is not a scalar field")]
    NotAScalar(String),
    /// Array index past the declared element count.
    #[error("index {index} out of range for `{path}` of length {len}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    /// The path string itself is malformed (e.g. `a[x]`).
    #[error("malformed field path `{0}`")]
    MalformedPath(String),
}

/// Errors produced when reading text emitted by [crate::render::pretty_dict].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("invalid literal: {0}")]
    Syntax(String),
    /// Integer does not fit in 64 bits.
    #[error("integer literal out of range: {0}")]
    IntegerOverflow(String),
    /// The same key appears twice in one mapping.
    #[error("duplicate key `{0}` in mapping literal")]
    DuplicateKey(String),
}
