//! Byte and bit placement of validated fields.
//!
//! Structs are packed with 1-byte alignment. Consecutive bit-fields sharing a
//! storage type are packed LSB-first into one storage unit while they fit;
//! any other field closes the unit. Union members all start at offset 0.

use crate::{
    field::{FieldType, NamedField},
    scalar::Scalar,
};

/// Struct (sequential members) or union (overlapping members).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Struct,
    Union,
}

/// Position of a bit-field inside its storage unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSlot {
    pub shift: u32,
    pub width: u32,
}

/// A field with its resolved position inside the owning record.
#[derive(Debug, Clone)]
pub struct LaidOutField {
    pub name: String,
    pub reserved: bool,
    pub ty: FieldType,
    /// Byte offset from the start of the owning record.
    pub offset: usize,
    pub bits: Option<BitSlot>,
}

impl LaidOutField {
    pub fn bit_width(&self) -> Option<u32> {
        self.bits.map(|b| b.width)
    }
}

struct OpenUnit {
    storage: Scalar,
    offset: usize,
    used: u32,
}

/// Places `fields` according to `kind`. Returns the placed fields and the total size in bytes.
pub fn lay_out(fields: Vec<NamedField>, kind: Kind) -> (Vec<LaidOutField>, usize) {
    let mut placed = Vec::with_capacity(fields.len());

    match kind {
        Kind::Union => {
            let mut size = 0;
            for field in fields {
                size = size.max(field.ty.size());
                placed.push(LaidOutField {
                    bits: field.bit_width.map(|width| BitSlot { shift: 0, width }),
                    name: field.name,
                    reserved: field.reserved,
                    ty: field.ty,
                    offset: 0,
                });
            }
            (placed, size)
        }
        Kind::Struct => {
            let mut offset = 0;
            let mut unit: Option<OpenUnit> = None;

            for field in fields {
                let (field_offset, bits) = match (field.bit_width, &field.ty) {
                    (Some(width), FieldType::Scalar(storage)) => {
                        let storage = *storage;
                        match unit.as_mut() {
                            Some(open)
                                if open.storage == storage
                                    && open.used + width <= storage.bits() =>
                            {
                                let slot = BitSlot { shift: open.used, width };
                                open.used += width;
                                (open.offset, Some(slot))
                            }
                            _ => {
                                let unit_offset = offset;
                                offset += storage.size();
                                unit = Some(OpenUnit {
                                    storage,
                                    offset: unit_offset,
                                    used: width,
                                });
                                (unit_offset, Some(BitSlot { shift: 0, width }))
                            }
                        }
                    }
                    _ => {
                        unit = None;
                        let field_offset = offset;
                        offset += field.ty.size();
                        (field_offset, None)
                    }
                };

                placed.push(LaidOutField {
                    name: field.name,
                    reserved: field.reserved,
                    ty: field.ty,
                    offset: field_offset,
                    bits,
                });
            }

            (placed, offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::array;

    fn named(name: &str, ty: impl Into<FieldType>, bit_width: Option<u32>) -> NamedField {
        NamedField {
            name: name.to_string(),
            reserved: false,
            ty: ty.into(),
            bit_width,
        }
    }

    #[test]
    fn test_struct_is_packed() {
        let (fields, size) = lay_out(
            vec![
                named("a", Scalar::U16, None),
                named("b", Scalar::U8, None),
                named("c", Scalar::U32, None),
            ],
            Kind::Struct,
        );

        let offsets: Vec<usize> = fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 2, 3]);
        assert_eq!(size, 7);
    }

    #[test]
    fn test_bit_fields_share_unit() {
        let (fields, size) = lay_out(
            vec![
                named("a", Scalar::U8, Some(4)),
                named("b", Scalar::U8, Some(4)),
                named("c", Scalar::U8, Some(1)),
            ],
            Kind::Struct,
        );

        assert_eq!(size, 2);
        assert_eq!(fields[0].bits, Some(BitSlot { shift: 0, width: 4 }));
        assert_eq!(fields[1].bits, Some(BitSlot { shift: 4, width: 4 }));
        assert_eq!(fields[1].offset, 0);
        assert_eq!(fields[2].offset, 1);
        assert_eq!(fields[2].bits, Some(BitSlot { shift: 0, width: 1 }));
    }

    #[test]
    fn test_storage_change_opens_new_unit() {
        let (fields, size) = lay_out(
            vec![
                named("a", Scalar::U8, Some(2)),
                named("b", Scalar::U16, Some(2)),
                named("c", Scalar::U16, Some(14)),
            ],
            Kind::Struct,
        );

        assert_eq!(size, 3);
        assert_eq!(fields[1].offset, 1);
        assert_eq!(fields[2].offset, 1);
        assert_eq!(fields[2].bits, Some(BitSlot { shift: 2, width: 14 }));
    }

    #[test]
    fn test_plain_field_closes_unit() {
        let (fields, size) = lay_out(
            vec![
                named("a", Scalar::U8, Some(1)),
                named("b", Scalar::U8, None),
                named("c", Scalar::U8, Some(1)),
            ],
            Kind::Struct,
        );

        assert_eq!(size, 3);
        assert_eq!(fields[2].offset, 2);
    }

    #[test]
    fn test_union_overlaps() {
        let (fields, size) = lay_out(
            vec![
                named("a", Scalar::U8, None),
                named("b", array(3, Scalar::U16), None),
                named("c", Scalar::U32, Some(5)),
            ],
            Kind::Union,
        );

        assert!(fields.iter().all(|f| f.offset == 0));
        assert_eq!(size, 6);
        assert_eq!(fields[2].bits, Some(BitSlot { shift: 0, width: 5 }));
    }
}
