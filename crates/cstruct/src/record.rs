//! RecordType: a built struct or union with resolved layout and directives.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    directive::{DefaultValue, EnumLabel},
    errors::SchemaError,
    field::{Decl, FieldType, validate_fields},
    layout::{BitSlot, Kind, LaidOutField, lay_out},
    scalar::Scalar,
};

/// A scalar location relative to the start of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarPlace {
    pub offset: usize,
    pub scalar: Scalar,
    pub bits: Option<BitSlot>,
}

/// A default-value directive with its path resolved against the layout.
#[derive(Debug, Clone)]
pub struct ResolvedDefault {
    pub directive: DefaultValue,
    pub place: ScalarPlace,
    pub raw: u64,
}

/// A struct or union type. Build with [RecordType::build] or the helpers in [crate::builder],
/// then create instances with [RecordType::instantiate].
#[derive(Debug)]
pub struct RecordType {
    kind: Kind,
    anonymous: bool,
    size: usize,
    /// Fields in declaration order.
    fields: Vec<LaidOutField>,
    /// Names of fields whose type is an anonymous record.
    anonymous_fields: Vec<String>,
    defaults: Vec<ResolvedDefault>,
    enums: IndexMap<String, EnumLabel>,
}

impl RecordType {
    /// Validates `decls`, lays the fields out and resolves every default-value path.
    pub fn build(decls: Vec<Decl>, kind: Kind, anonymous: bool) -> Result<Arc<Self>, SchemaError> {
        let validated = validate_fields(decls)?;
        let (fields, size) = lay_out(validated.fields, kind);

        let anonymous_fields = fields
            .iter()
            .filter(|f| f.ty.is_anonymous_record())
            .map(|f| f.name.clone())
            .collect();

        let mut record = RecordType {
            kind,
            anonymous,
            size,
            fields,
            anonymous_fields,
            defaults: Vec::with_capacity(validated.defaults.len()),
            enums: validated.enums,
        };

        let mut defaults = Vec::with_capacity(validated.defaults.len());
        for directive in validated.defaults {
            defaults.push(record.resolve_default(directive)?);
        }
        record.defaults = defaults;

        log::debug!(
            "built {} of {} bytes: {} fields, {} defaults, {} enum labels",
            record.name(),
            record.size,
            record.fields.len(),
            record.defaults.len(),
            record.enums.len()
        );

        Ok(Arc::new(record))
    }

    /// `struct`, `union`, `struct.anon` or `union.anon`.
    pub fn name(&self) -> &'static str {
        match (self.kind, self.anonymous) {
            (Kind::Struct, false) => "struct",
            (Kind::Struct, true) => "struct.anon",
            (Kind::Union, false) => "union",
            (Kind::Union, true) => "union.anon",
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_union(&self) -> bool {
        self.kind == Kind::Union
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Total size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fields(&self) -> &[LaidOutField] {
        &self.fields
    }

    pub fn anonymous_fields(&self) -> &[String] {
        &self.anonymous_fields
    }

    pub fn defaults(&self) -> &[ResolvedDefault] {
        &self.defaults
    }

    pub fn enum_label(&self, field: &str) -> Option<&EnumLabel> {
        self.enums.get(field)
    }

    /// Finds a named member, looking through anonymous members when no direct field matches.
    /// Returns the field and its byte offset from the start of this record.
    pub fn member(&self, name: &str) -> Option<(&LaidOutField, usize)> {
        if let Some(field) = self.fields.iter().find(|f| !f.reserved && f.name == name) {
            return Some((field, field.offset));
        }

        self.fields.iter().find_map(|f| match &f.ty {
            FieldType::Record(inner) if inner.is_anonymous() => inner
                .member(name)
                .map(|(field, offset)| (field, f.offset + offset)),
            _ => None,
        })
    }

    fn resolve_default(&self, directive: DefaultValue) -> Result<ResolvedDefault, SchemaError> {
        let fail = |reason: String| SchemaError::Initialization {
            origin: directive.origin.clone(),
            reason,
        };

        let Some(raw) = directive.value.as_raw() else {
            return Err(fail(format!("{} is not a number", directive.value)));
        };

        let mut record = self;
        let mut offset = 0;
        let (last, parents) = directive
            .path
            .split_last()
            .ok_or_else(|| fail("empty path".to_string()))?;

        for segment in parents {
            let (field, field_offset) = record
                .member(segment)
                .ok_or_else(|| fail(format!("no field `{}` in {}", segment, record.name())))?;
            let FieldType::Record(inner) = &field.ty else {
                return Err(fail(format!("`{}` is not a struct or union", segment)));
            };
            offset += field_offset;
            record = inner.as_ref();
        }

        let (field, field_offset) = record
            .member(last)
            .ok_or_else(|| fail(format!("no field `{}` in {}", last, record.name())))?;
        let FieldType::Scalar(scalar) = &field.ty else {
            return Err(fail(format!("`{}` is not a scalar field", last)));
        };

        let place = ScalarPlace {
            offset: offset + field_offset,
            scalar: *scalar,
            bits: field.bits,
        };

        Ok(ResolvedDefault {
            directive,
            place,
            raw,
        })
    }
}

/// Record types compare by identity, like distinct declarations of equal shape in C.
impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for RecordType {}
