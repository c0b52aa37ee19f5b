//! Live instances of a [RecordType] and typed access to their fields.

use std::{fmt, sync::Arc};

use crate::{
    bits::{extract_bits, insert_bits, read_unit, sign_extend, write_unit},
    errors::AccessError,
    field::FieldType,
    layout::{BitSlot, LaidOutField},
    record::{RecordType, ScalarPlace},
    scalar::Scalar,
    value::Value,
};

/// Zero-initialized storage for one record, owned by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Instance {
    ty: Arc<RecordType>,
    data: Vec<u8>,
}

impl RecordType {
    /// Creates a zero-filled instance, then applies default values: nested records first
    /// (depth-first, declaration order), then this record's own directives in order.
    pub fn instantiate(self: &Arc<Self>) -> Instance {
        let mut data = vec![0u8; self.size()];
        apply_defaults(self, &mut data, 0);

        Instance {
            ty: Arc::clone(self),
            data,
        }
    }
}

fn apply_defaults(record: &RecordType, data: &mut [u8], base: usize) {
    for field in record.fields() {
        init_nested(&field.ty, data, base + field.offset);
    }

    for default in record.defaults() {
        write_scalar(data, base, &default.place, default.raw);
    }
}

fn init_nested(ty: &FieldType, data: &mut [u8], offset: usize) {
    match ty {
        FieldType::Scalar(_) => {}
        FieldType::Record(record) => apply_defaults(record, data, offset),
        FieldType::Array(count, element) => {
            let stride = element.size();
            for i in 0..*count {
                init_nested(element, data, offset + i * stride);
            }
        }
    }
}

fn write_scalar(data: &mut [u8], base: usize, place: &ScalarPlace, raw: u64) {
    Node::Scalar(place.scalar, place.bits).write(data, base + place.offset, raw);
}

impl Instance {
    /// Copies `bytes` into a fresh zero-filled instance; extra bytes are ignored.
    /// No default values are applied.
    pub fn from_bytes(ty: &Arc<RecordType>, bytes: &[u8]) -> Self {
        let mut data = vec![0u8; ty.size()];
        let n = bytes.len().min(data.len());
        data[..n].copy_from_slice(&bytes[..n]);

        Instance {
            ty: Arc::clone(ty),
            data,
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Total size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reads the field at `path` (`a`, `c.cs.c0`, `e[1].e0`, `f[0]`).
    /// Scalars yield numbers, arrays lists and records mappings.
    pub fn get(&self, path: &str) -> Result<Value, AccessError> {
        let place = resolve(&self.ty, path)?;
        Ok(place.value(&self.data))
    }

    /// Writes a number to the scalar field at `path`, truncating it to the field width.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), AccessError> {
        let place = resolve(&self.ty, path)?;
        let Node::Scalar(..) = place.node else {
            return Err(AccessError::NotAScalar(path.to_string()));
        };
        let raw = value
            .into()
            .as_raw()
            .ok_or_else(|| AccessError::NotAScalar(path.to_string()))?;

        place.write(&mut self.data, raw);
        Ok(())
    }

    pub(crate) fn root(&self) -> Place<'_> {
        Place::root(&self.ty)
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn root_and_data_mut(&mut self) -> (Place<'_>, &mut [u8]) {
        (Place::root(&self.ty), &mut self.data)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render::render(self))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("data", &self.data)
            .finish()
    }
}

enum Step<'p> {
    Name(&'p str),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<Step<'_>>, AccessError> {
    let malformed = || AccessError::MalformedPath(path.to_string());
    let mut steps = Vec::new();

    for segment in path.trim().split('.') {
        let (name, mut rest) = match segment.find('[') {
            Some(pos) => segment.split_at(pos),
            None => (segment, ""),
        };

        let name = name.trim();
        if name.is_empty() && (rest.is_empty() || steps.is_empty()) {
            return Err(malformed());
        }
        if !name.is_empty() {
            steps.push(Step::Name(name));
        }

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(malformed)?;
            let index = rest[1..close].trim().parse::<usize>().map_err(|_| malformed())?;
            steps.push(Step::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(malformed());
            }
        }
    }

    Ok(steps)
}

fn resolve<'a>(record: &'a RecordType, path: &str) -> Result<Place<'a>, AccessError> {
    let mut place = Place::root(record);
    let mut walked = String::new();

    for step in parse_path(path)? {
        match step {
            Step::Name(name) => {
                if !walked.is_empty() {
                    walked.push('.');
                }
                walked.push_str(name);
                place = place
                    .member(name)
                    .ok_or_else(|| AccessError::UnknownField(walked.clone()))?;
            }
            Step::Index(index) => {
                let Node::Array(len, _) = place.node else {
                    return Err(AccessError::NotAScalar(walked.clone()));
                };
                place = place.element(index).ok_or_else(|| AccessError::IndexOutOfRange {
                    path: walked.clone(),
                    index,
                    len,
                })?;
                walked.push_str(&format!("[{}]", index));
            }
        }
    }

    Ok(place)
}

/// What lives at a [Place].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node<'a> {
    Scalar(Scalar, Option<BitSlot>),
    Array(usize, &'a FieldType),
    Record(&'a RecordType),
}

impl<'a> Node<'a> {
    pub(crate) fn of(ty: &'a FieldType, bits: Option<BitSlot>) -> Self {
        match ty {
            FieldType::Scalar(scalar) => Node::Scalar(*scalar, bits),
            FieldType::Array(count, element) => Node::Array(*count, element.as_ref()),
            FieldType::Record(record) => Node::Record(record.as_ref()),
        }
    }

    fn read(&self, data: &[u8], offset: usize) -> Option<Value> {
        let Node::Scalar(scalar, bits) = *self else {
            return None;
        };

        let unit = read_unit(data, offset, scalar.size());
        let (raw, width) = match bits {
            Some(slot) => (extract_bits(unit, slot.shift, slot.width), slot.width),
            None => (unit, scalar.bits()),
        };

        Some(if scalar.is_signed() {
            Value::I64(sign_extend(raw, width))
        } else {
            Value::U64(raw)
        })
    }

    fn write(&self, data: &mut [u8], offset: usize, raw: u64) {
        let Node::Scalar(scalar, bits) = *self else {
            return;
        };

        let value = match bits {
            Some(slot) => {
                let unit = read_unit(data, offset, scalar.size());
                insert_bits(unit, slot.shift, slot.width, raw)
            }
            None => raw,
        };
        write_unit(data, offset, scalar.size(), value);
    }
}

/// A typed location inside an instance buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Place<'a> {
    pub node: Node<'a>,
    /// Absolute byte offset in the instance buffer.
    pub offset: usize,
}

impl<'a> Place<'a> {
    pub(crate) fn root(record: &'a RecordType) -> Self {
        Place {
            node: Node::Record(record),
            offset: 0,
        }
    }

    /// Place of a field declared directly in the record at `self`.
    pub(crate) fn field(&self, field: &'a LaidOutField) -> Self {
        Place {
            node: Node::of(&field.ty, field.bits),
            offset: self.offset + field.offset,
        }
    }

    /// Named member lookup; `None` unless this is a record with such a member.
    pub(crate) fn member(&self, name: &str) -> Option<Self> {
        let Node::Record(record) = self.node else {
            return None;
        };

        record.member(name).map(|(field, offset)| Place {
            node: Node::of(&field.ty, field.bits),
            offset: self.offset + offset,
        })
    }

    /// Element lookup; `None` unless this is an array and `index` is in range.
    pub(crate) fn element(&self, index: usize) -> Option<Self> {
        let Node::Array(count, element) = self.node else {
            return None;
        };
        if index >= count {
            return None;
        }

        Some(Place {
            node: Node::of(element, None),
            offset: self.offset + index * element.size(),
        })
    }

    /// All elements of an array place; empty for anything else.
    pub(crate) fn elements(&self) -> Vec<Self> {
        match self.node {
            Node::Array(count, _) => (0..count).filter_map(|i| self.element(i)).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn scalar(&self, data: &[u8]) -> Option<Value> {
        self.node.read(data, self.offset)
    }

    pub(crate) fn write(&self, data: &mut [u8], raw: u64) {
        self.node.write(data, self.offset, raw)
    }

    /// Number, list or mapping for whatever lives here.
    pub(crate) fn value(&self, data: &[u8]) -> Value {
        match self.node {
            Node::Scalar(..) => self.scalar(data).unwrap_or(Value::U64(0)),
            Node::Array(..) => Value::List(self.elements().iter().map(|e| e.value(data)).collect()),
            Node::Record(_) => Value::Map(crate::dict::record_to_map(self, data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::{structure, structure_anon, union, union_anon},
        directive::cinit,
        field::{array, bits, field},
    };

    #[test]
    fn test_zero_initialized() {
        let ty =
            structure(vec![field("a", Scalar::U32), field("b", array(3, Scalar::U8))]).unwrap();
        let inst = ty.instantiate();
        assert_eq!(inst.size(), 7);
        assert!(inst.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_bit_fields_pack_into_one_byte() {
        let ty = structure(vec![bits("a", Scalar::U8, 4), bits("b", Scalar::U8, 4)]).unwrap();
        let mut inst = ty.instantiate();

        inst.set("a", 0xfu8).unwrap();
        inst.set("b", 0x3u8).unwrap();

        assert_eq!(inst.as_bytes(), &[0x3f]);
        assert_eq!(inst.get("a").unwrap(), Value::U64(0xf));
        assert_eq!(inst.get("b").unwrap(), Value::U64(0x3));
    }

    #[test]
    fn test_set_truncates_to_width() {
        let ty = structure(vec![bits("a", Scalar::U8, 3), field("b", Scalar::U8)]).unwrap();
        let mut inst = ty.instantiate();

        inst.set("a", 0xffu8).unwrap();
        inst.set("b", 0x1ffu16).unwrap();

        assert_eq!(inst.get("a").unwrap(), Value::U64(7));
        assert_eq!(inst.get("b").unwrap(), Value::U64(0xff));
    }

    #[test]
    fn test_signed_fields_sign_extend() {
        let ty = structure(vec![field("a", Scalar::I16), bits("b", Scalar::I8, 4)]).unwrap();
        let mut inst = ty.instantiate();

        inst.set("a", -2i16).unwrap();
        inst.set("b", 0xfu8).unwrap();

        assert_eq!(inst.get("a").unwrap(), Value::I64(-2));
        assert_eq!(inst.get("b").unwrap(), Value::I64(-1));
        assert_eq!(&inst.as_bytes()[..2], &[0xfe, 0xff]);
    }

    #[test]
    fn test_union_members_overlap() {
        let ty =
            union(vec![field("word", Scalar::U16), field("bytes", array(2, Scalar::U8))]).unwrap();
        let mut inst = ty.instantiate();

        inst.set("word", 0x1234u16).unwrap();
        assert_eq!(inst.get("bytes[0]").unwrap(), Value::U64(0x34));
        assert_eq!(inst.get("bytes[1]").unwrap(), Value::U64(0x12));
    }

    #[test]
    fn test_nested_array_access() {
        let elem = structure(vec![bits("e0", Scalar::U8, 1), bits("e1", Scalar::U8, 2)]).unwrap();
        let ty = structure(vec![field("e", array(2, &elem))]).unwrap();
        let mut inst = ty.instantiate();

        inst.set("e[1].e1", 3u8).unwrap();
        assert_eq!(inst.as_bytes(), &[0x00, 0x06]);
        assert_eq!(
            inst.get("e[1]").unwrap(),
            Value::map([("e0", 0u8), ("e1", 3)])
        );
    }

    #[test]
    fn test_access_errors() {
        let ty = structure(vec![field("f", array(2, Scalar::U32))]).unwrap();
        let mut inst = ty.instantiate();

        assert_eq!(inst.get("g"), Err(AccessError::UnknownField("g".to_string())));
        assert_eq!(inst.set("f", 1u8), Err(AccessError::NotAScalar("f".to_string())));
        assert_eq!(
            inst.get("f[2]"),
            Err(AccessError::IndexOutOfRange {
                path: "f".to_string(),
                index: 2,
                len: 2
            })
        );
        assert!(matches!(inst.get("f[x]"), Err(AccessError::MalformedPath(_))));
        assert!(matches!(inst.get(""), Err(AccessError::MalformedPath(_))));
    }

    #[test]
    fn test_defaults_apply_after_nested_init() {
        let cs = structure(vec![
            bits("c0", Scalar::U8, 4),
            bits("c1", Scalar::U8, 4),
            cinit("c1", 5),
        ])
        .unwrap();
        let c = union_anon(vec![field("cv", Scalar::U8), field("cs", &cs)]).unwrap();
        let d = structure_anon(vec![bits("d0", Scalar::U8, 1), bits("d1", Scalar::U8, 2)]).unwrap();
        let ty = structure(vec![
            field("a", Scalar::U16),
            field("d", &d),
            field("c", &c),
            cinit("a", 1),
            cinit("c.cs.c0", 2),
            cinit("d1", 3),
        ])
        .unwrap();

        let inst = ty.instantiate();
        assert_eq!(inst.get("a").unwrap(), Value::U64(1));
        assert_eq!(inst.get("c.cs.c0").unwrap(), Value::U64(2));
        assert_eq!(inst.get("c.cs.c1").unwrap(), Value::U64(5));
        assert_eq!(inst.get("cv").unwrap(), Value::U64(0x52));
        assert_eq!(inst.get("d1").unwrap(), Value::U64(3));
        assert_eq!(inst.get("d.d0").unwrap(), Value::U64(0));
    }

    #[test]
    fn test_defaults_reach_array_elements() {
        let elem = structure(vec![field("x", Scalar::U8), cinit("x", 7)]).unwrap();
        let ty = structure(vec![field("items", array(3, &elem))]).unwrap();
        assert_eq!(ty.instantiate().as_bytes(), &[7, 7, 7]);
    }

    #[test]
    fn test_later_default_wins() {
        let ty = structure(vec![field("a", Scalar::U8), cinit("a", 1), cinit("a", 2)]).unwrap();
        assert_eq!(ty.instantiate().get("a").unwrap(), Value::U64(2));
    }

    #[test]
    fn test_from_bytes_pads_and_truncates() {
        let ty = structure(vec![field("a", Scalar::U16), cinit("a", 9)]).unwrap();
        assert_eq!(Instance::from_bytes(&ty, &[1]).as_bytes(), &[1, 0]);
        assert_eq!(Instance::from_bytes(&ty, &[1, 2, 3]).as_bytes(), &[1, 2]);
    }
}
