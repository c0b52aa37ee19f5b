//! Declarations used to build a [crate::record::RecordType] and their validation.

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexMap;

use crate::{
    directive::{DefaultValue, EnumLabel},
    errors::SchemaError,
    record::RecordType,
    scalar::Scalar,
};

/// Type of a declared field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(Scalar),
    /// Fixed number of elements of one type.
    Array(usize, Box<FieldType>),
    /// A previously built struct or union.
    Record(Arc<RecordType>),
}

impl FieldType {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            FieldType::Scalar(s) => s.size(),
            FieldType::Array(count, element) => count * element.size(),
            FieldType::Record(record) => record.size(),
        }
    }

    /// Type tag shown by [crate::render::render], e.g. `u16`, `u8[4]`, `struct.anon`.
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Scalar(s) => s.name().to_string(),
            FieldType::Array(count, element) => {
                let mut dims = format!("[{}]", count);
                let mut inner = element.as_ref();
                while let FieldType::Array(count, element) = inner {
                    dims.push_str(&format!("[{}]", count));
                    inner = element.as_ref();
                }
                format!("{}{}", inner.type_name(), dims)
            }
            FieldType::Record(record) => record.name().to_string(),
        }
    }

    pub fn is_anonymous_record(&self) -> bool {
        matches!(self, FieldType::Record(record) if record.is_anonymous())
    }
}

impl From<Scalar> for FieldType {
    fn from(s: Scalar) -> Self {
        FieldType::Scalar(s)
    }
}

impl From<Arc<RecordType>> for FieldType {
    fn from(record: Arc<RecordType>) -> Self {
        FieldType::Record(record)
    }
}

impl From<&Arc<RecordType>> for FieldType {
    fn from(record: &Arc<RecordType>) -> Self {
        FieldType::Record(Arc::clone(record))
    }
}

/// A single declared field. An empty name declares a reserved field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
    /// Bit width for bit-fields; only valid on scalar types.
    pub bit_width: Option<u32>,
}

/// One entry of a declaration list.
#[derive(Debug, Clone)]
pub enum Decl {
    Field(FieldDecl),
    Default(DefaultValue),
    Enum(EnumLabel),
}

/// Declares a field of the given type.
pub fn field(name: &str, ty: impl Into<FieldType>) -> Decl {
    Decl::Field(FieldDecl {
        name: name.to_string(),
        ty: ty.into(),
        bit_width: None,
    })
}

/// Declares a bit-field of `width` bits stored in `storage`.
pub fn bits(name: &str, storage: Scalar, width: u32) -> Decl {
    Decl::Field(FieldDecl {
        name: name.to_string(),
        ty: FieldType::Scalar(storage),
        bit_width: Some(width),
    })
}

/// Array type of `count` elements.
pub fn array(count: usize, element: impl Into<FieldType>) -> FieldType {
    FieldType::Array(count, Box::new(element.into()))
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::TypeDef> for FieldType {
    type Error = SchemaError;

    fn try_from(value: crate::serde::TypeDef) -> Result<Self, Self::Error> {
        use crate::{layout::Kind, serde::TypeDef};

        let (kind, body) = match value {
            TypeDef::Scalar { scalar } => return Ok(FieldType::Scalar(scalar)),
            TypeDef::Array { count, element } => {
                return Ok(array(count, FieldType::try_from(*element)?));
            }
            TypeDef::Struct(body) => (Kind::Struct, body),
            TypeDef::Union(body) => (Kind::Union, body),
        };

        let decls = body
            .fields
            .into_iter()
            .map(Decl::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        RecordType::build(decls, kind, body.anonymous).map(FieldType::Record)
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::DeclDef> for Decl {
    type Error = SchemaError;

    fn try_from(value: crate::serde::DeclDef) -> Result<Self, Self::Error> {
        use crate::serde::DeclDef;

        Ok(match value {
            DeclDef::Field { name, ty, bits } => Decl::Field(FieldDecl {
                name,
                ty: ty.try_into()?,
                bit_width: bits,
            }),
            DeclDef::Init { path, value } => Decl::Default(DefaultValue::new(&path, value)),
            DeclDef::Enum { field, labels } => {
                let labels = crate::directive::Labels::try_from(labels)?;
                Decl::Enum(EnumLabel::new(&field, labels))
            }
        })
    }
}

/// A field after name normalization.
#[derive(Debug, Clone)]
pub struct NamedField {
    pub name: String,
    /// Declared with an empty name; `name` is synthetic.
    pub reserved: bool,
    pub ty: FieldType,
    pub bit_width: Option<u32>,
}

/// Fields and directives split out of a declaration list, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub fields: Vec<NamedField>,
    pub defaults: Vec<DefaultValue>,
    /// Later directives for the same field replace earlier ones.
    pub enums: IndexMap<String, EnumLabel>,
}

const RESERVED_PREFIX: &str = "__rsvd_";

/// Splits directives from fields, names reserved fields and rejects duplicates.
pub fn validate_fields(decls: Vec<Decl>) -> Result<Validated, SchemaError> {
    let mut validated = Validated::default();
    let mut reserved_count = 0usize;

    // Synthetic names skip anything the caller declared.
    let declared: HashSet<String> = decls
        .iter()
        .filter_map(|decl| match decl {
            Decl::Field(f) => Some(f.name.trim().to_string()),
            _ => None,
        })
        .collect();

    for decl in decls {
        match decl {
            Decl::Default(d) => validated.defaults.push(d),
            Decl::Enum(e) => {
                if e.field.is_empty() {
                    return Err(SchemaError::Configuration(format!(
                        "cenum() needs a field name: {}",
                        e.origin
                    )));
                }
                validated.enums.insert(e.field.clone(), e);
            }
            Decl::Field(f) => {
                let trimmed = f.name.trim();
                let (name, reserved) = if trimmed.is_empty() {
                    let name = loop {
                        let name = format!("{}{}", RESERVED_PREFIX, reserved_count);
                        reserved_count += 1;
                        if !declared.contains(&name) {
                            break name;
                        }
                    };
                    (name, true)
                } else {
                    (trimmed.to_string(), false)
                };

                if !reserved
                    && validated
                        .fields
                        .iter()
                        .any(|other| !other.reserved && other.name == name)
                {
                    return Err(SchemaError::DuplicateField(name));
                }

                if let Some(width) = f.bit_width {
                    let FieldType::Scalar(storage) = &f.ty else {
                        return Err(SchemaError::BitFieldOnNonScalar(name));
                    };
                    if width == 0 || width > storage.bits() {
                        return Err(SchemaError::InvalidBitWidth {
                            field: name,
                            width,
                            storage_bits: storage.bits(),
                        });
                    }
                }

                validated.fields.push(NamedField {
                    name,
                    reserved,
                    ty: f.ty,
                    bit_width: f.bit_width,
                });
            }
        }
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{cenum, cinit};

    #[test]
    fn test_separates_directives_and_keeps_order() {
        let v = validate_fields(vec![
            field("b", Scalar::U8),
            cinit("b", 1),
            field("a", Scalar::U16),
            cenum("a", [(0, "Zero")]),
        ])
        .unwrap();

        let names: Vec<&str> = v.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(v.defaults.len(), 1);
        assert!(v.enums.contains_key("a"));
    }

    #[test]
    fn test_names_are_trimmed() {
        let v = validate_fields(vec![field("  x \t", Scalar::U8)]).unwrap();
        assert_eq!(v.fields[0].name, "x");
        assert!(!v.fields[0].reserved);
    }

    #[test]
    fn test_reserved_names_are_unique() {
        let v = validate_fields(vec![
            field("", Scalar::U8),
            field(" ", Scalar::U8),
            field("a", Scalar::U8),
        ])
        .unwrap();

        assert!(v.fields[0].reserved && v.fields[1].reserved);
        assert_ne!(v.fields[0].name, v.fields[1].name);
        assert!(v.fields[0].name.starts_with(RESERVED_PREFIX));
    }

    #[test]
    fn test_reserved_names_skip_declared_names() {
        let v = validate_fields(vec![
            field("__rsvd_0", Scalar::U8),
            field("", Scalar::U8),
            field("", Scalar::U8),
            field("__rsvd_2", Scalar::U8),
        ])
        .unwrap();

        let names: Vec<&str> = v.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["__rsvd_0", "__rsvd_1", "__rsvd_3", "__rsvd_2"]);
        assert!(!v.fields[0].reserved && v.fields[1].reserved && v.fields[2].reserved);

        let ty = RecordType::build(
            vec![field("__rsvd_0", Scalar::U8), field("", Scalar::U8)],
            crate::layout::Kind::Struct,
            false,
        )
        .unwrap();
        let mut inst = ty.instantiate();
        inst.set("__rsvd_0", 7u8).unwrap();
        assert_eq!(inst.as_bytes(), &[7, 0]);
    }

    #[test]
    fn test_nested_array_type_name() {
        assert_eq!(array(4, Scalar::U8).type_name(), "u8[4]");
        assert_eq!(array(2, array(3, Scalar::I16)).type_name(), "i16[2][3]");
        assert_eq!(
            array(2, array(3, array(4, Scalar::U32))).type_name(),
            "u32[2][3][4]"
        );
    }

    #[test]
    fn test_duplicate_after_trim() {
        let err = validate_fields(vec![field("a", Scalar::U8), field(" a", Scalar::U16)])
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("a".to_string()));
    }

    #[test]
    fn test_bit_width_checks() {
        assert!(matches!(
            validate_fields(vec![bits("a", Scalar::U8, 9)]),
            Err(SchemaError::InvalidBitWidth { width: 9, storage_bits: 8, .. })
        ));
        assert!(matches!(
            validate_fields(vec![bits("a", Scalar::U8, 0)]),
            Err(SchemaError::InvalidBitWidth { width: 0, .. })
        ));

        let decl = Decl::Field(FieldDecl {
            name: "arr".to_string(),
            ty: array(2, Scalar::U8),
            bit_width: Some(3),
        });
        assert_eq!(
            validate_fields(vec![decl]).unwrap_err(),
            SchemaError::BitFieldOnNonScalar("arr".to_string())
        );
    }

    #[test]
    fn test_enum_without_field_name() {
        let err = validate_fields(vec![cenum(" . ", [(0, "Zero")])]).unwrap_err();
        assert!(matches!(err, SchemaError::Configuration(_)));
    }
}
