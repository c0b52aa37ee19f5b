//! Conversion between instances and nested [Value] mappings.
//!
//! [Instance::to_dict] is lossless for every non-reserved field. [Instance::load_dict] is
//! best-effort: data that does not match the record shape is skipped with a [LoadWarning]
//! instead of failing the load.

use std::{fmt, panic::Location, sync::Arc};

use crate::{
    instance::{Instance, Node, Place},
    record::RecordType,
    value::{Map, Value},
};

/// Why part of the input was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A sequence was given for something that is not an array.
    NotAnArray,
    /// A number was given for a member that does not exist.
    UnknownField { value: Value },
    /// A sequence or mapping was given for a member that does not exist.
    MissingTarget,
    /// A sequence is longer than the target array.
    IndexOutOfRange { len: usize },
    /// A number was given for an array or record.
    NotAScalar { value: Value },
}

/// A skipped part of the input of a load, with the call site that started the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Location in the record, e.g. `.d.invalid_field` or `.e[3]`.
    pub path: String,
    pub kind: WarningKind,
    pub caller: &'static Location<'static>,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = |v: &Value| v.to_hex().unwrap_or_default();
        match &self.kind {
            WarningKind::NotAnArray => write!(
                f,
                "when load_dict to record, {} is not an array and ignored",
                self.path
            )?,
            WarningKind::UnknownField { value } => write!(
                f,
                "when load_dict to record, {} does not exist and setting it to {}({}) is ignored",
                self.path,
                value,
                hex(value)
            )?,
            WarningKind::MissingTarget => write!(
                f,
                "when load_dict to record, {} does not exist and its data is ignored",
                self.path
            )?,
            WarningKind::IndexOutOfRange { len } => write!(
                f,
                "when load_dict to record, {} is past the end of an array of {} and ignored",
                self.path, len
            )?,
            WarningKind::NotAScalar { value } => write!(
                f,
                "when load_dict to record, {} is not a scalar and setting it to {}({}) is ignored",
                self.path,
                value,
                hex(value)
            )?,
        }
        write!(f, " (load_dict called at {})", self.caller)
    }
}

/// Warnings collected by one load, in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadWarning> {
        self.warnings.iter()
    }
}

impl Instance {
    /// Nested mapping of every non-reserved field in declaration order. Members of reserved
    /// anonymous records are merged into the enclosing mapping.
    pub fn to_dict(&self) -> Map {
        record_to_map(&self.root(), self.data())
    }

    /// Loads `data` into this instance. Never fails; skipped parts are logged and reported.
    #[track_caller]
    pub fn load_dict(&mut self, data: &Value) -> LoadReport {
        let caller = Location::caller();
        self.load_from(data, caller)
    }

    /// Like [Instance::load_dict], with `overrides` merged over a mapping `data` first.
    #[track_caller]
    pub fn load_dict_with<K, V, I>(&mut self, data: &Value, overrides: I) -> LoadReport
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let caller = Location::caller();
        let merged = merge_overrides(data, overrides);
        self.load_from(merged.as_ref().unwrap_or(data), caller)
    }

    fn load_from(&mut self, data: &Value, caller: &'static Location<'static>) -> LoadReport {
        let (root, bytes) = self.root_and_data_mut();
        let mut loader = Loader {
            data: bytes,
            caller,
            report: LoadReport::default(),
        };
        loader.load(Some(root), data, String::new());
        loader.report
    }
}

impl RecordType {
    /// Instantiates this type and loads `data` into the new instance.
    #[track_caller]
    pub fn load_dict(self: &Arc<Self>, data: &Value) -> (Instance, LoadReport) {
        let caller = Location::caller();
        let mut instance = self.instantiate();
        let report = instance.load_from(data, caller);
        (instance, report)
    }

    /// Like [RecordType::load_dict], with `overrides` merged over a mapping `data` first.
    #[track_caller]
    pub fn load_dict_with<K, V, I>(
        self: &Arc<Self>,
        data: &Value,
        overrides: I,
    ) -> (Instance, LoadReport)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let caller = Location::caller();
        let merged = merge_overrides(data, overrides);
        let mut instance = self.instantiate();
        let report = instance.load_from(merged.as_ref().unwrap_or(data), caller);
        (instance, report)
    }
}

/// Copy of `data` with `overrides` applied, or `None` when there is nothing to merge.
fn merge_overrides<K, V, I>(data: &Value, overrides: I) -> Option<Value>
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut overrides = overrides.into_iter().peekable();
    overrides.peek()?;

    let mut merged = data.as_map()?.clone();
    for (k, v) in overrides {
        merged.insert(k.into(), v.into());
    }
    Some(Value::Map(merged))
}

pub(crate) fn record_to_map(place: &Place<'_>, data: &[u8]) -> Map {
    let mut map = Map::new();
    let Node::Record(record) = place.node else {
        return map;
    };

    for field in record.fields() {
        let child = place.field(field);
        if field.reserved {
            if field.ty.is_anonymous_record() {
                map.extend(record_to_map(&child, data));
            }
            continue;
        }
        map.insert(field.name.clone(), child.value(data));
    }

    map
}

struct Loader<'d> {
    data: &'d mut [u8],
    caller: &'static Location<'static>,
    report: LoadReport,
}

impl Loader<'_> {
    fn warn(&mut self, path: String, kind: WarningKind) {
        let warning = LoadWarning {
            path,
            kind,
            caller: self.caller,
        };
        log::warn!("{}", warning);
        self.report.warnings.push(warning);
    }

    fn load(&mut self, target: Option<Place<'_>>, value: &Value, path: String) {
        let Some(place) = target else {
            self.warn(path, WarningKind::MissingTarget);
            return;
        };

        match value {
            Value::List(items) => {
                let Node::Array(len, _) = place.node else {
                    self.warn(path, WarningKind::NotAnArray);
                    return;
                };

                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    match place.element(i) {
                        None => self.warn(item_path, WarningKind::IndexOutOfRange { len }),
                        Some(element) if item.is_number() => self.assign(element, item, item_path),
                        Some(element) => self.load(Some(element), item, item_path),
                    }
                }
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    let item_path = format!("{}.{}", path, key);
                    let member = place.member(key);
                    if item.is_number() {
                        match member {
                            Some(member) => self.assign(member, item, item_path),
                            None => {
                                let kind = WarningKind::UnknownField {
                                    value: item.clone(),
                                };
                                self.warn(item_path, kind);
                            }
                        }
                    } else {
                        self.load(member, item, item_path);
                    }
                }
            }
            Value::U64(_) | Value::I64(_) => self.assign(place, value, path),
        }
    }

    fn assign(&mut self, place: Place<'_>, value: &Value, path: String) {
        match (place.node, value.as_raw()) {
            (Node::Scalar(..), Some(raw)) => place.write(self.data, raw),
            _ => self.warn(path, WarningKind::NotAScalar { value: value.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::{structure, structure_anon, union_anon},
        field::{array, bits, field},
        scalar::Scalar,
    };

    fn sample() -> Arc<RecordType> {
        let d = structure_anon(vec![bits("d0", Scalar::U8, 1), bits("d1", Scalar::U8, 2)]).unwrap();
        let e = structure(vec![bits("e0", Scalar::U8, 1), bits("e1", Scalar::U8, 2)]).unwrap();
        let inner = union_anon(vec![field("lo", Scalar::U8), field("hi", Scalar::U8)]).unwrap();
        structure(vec![
            field("a", Scalar::U16),
            field("", Scalar::U16),
            field("d", &d),
            field("e", array(2, &e)),
            field("f", array(2, Scalar::U32)),
            field("", &inner),
        ])
        .unwrap()
    }

    #[test]
    fn test_to_dict_order_and_reserved() {
        let inst = sample().instantiate();
        let dict = inst.to_dict();
        let keys: Vec<&str> = dict.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "d", "e", "f", "lo", "hi"]);
    }

    #[test]
    fn test_to_dict_shapes() {
        let mut inst = sample().instantiate();
        inst.set("f[1]", 456u32).unwrap();
        inst.set("e[0].e1", 2u8).unwrap();
        inst.set("d1", 3u8).unwrap();

        let dict = inst.to_dict();
        assert_eq!(dict["f"], Value::from(vec![0u32, 456]));
        assert_eq!(dict["d"], Value::map([("d0", 0u8), ("d1", 3)]));
        assert_eq!(
            dict["e"],
            Value::List(vec![
                Value::map([("e0", 0u8), ("e1", 2)]),
                Value::map([("e0", 0u8), ("e1", 0)]),
            ])
        );
    }

    #[test]
    fn test_to_dict_is_deterministic() {
        let inst = sample().instantiate();
        assert_eq!(inst.to_dict(), inst.to_dict());
    }

    #[test]
    fn test_round_trip() {
        let ty = sample();
        let mut src = ty.instantiate();
        src.set("a", 0xbeefu16).unwrap();
        src.set("e[1].e0", 1u8).unwrap();
        src.set("f[0]", 123u32).unwrap();
        src.set("hi", 9u8).unwrap();

        let (copy, report) = ty.load_dict(&Value::Map(src.to_dict()));
        assert!(report.is_clean());
        assert_eq!(copy.to_string(), src.to_string());
        assert_eq!(copy.to_dict(), src.to_dict());
    }

    #[test]
    fn test_unknown_field_warns_once() {
        let mut inst = sample().instantiate();
        let before = inst.clone();

        let report = inst.load_dict(&Value::map([("nonexistent", 5u8)]));

        assert_eq!(report.len(), 1);
        assert_eq!(inst, before);
        let warning = &report.warnings[0];
        assert_eq!(warning.path, ".nonexistent");
        assert_eq!(warning.kind, WarningKind::UnknownField { value: Value::U64(5) });
        assert!(warning.to_string().contains("5(0x5)"));
        assert!(warning.caller.file().ends_with("dict.rs"));
    }

    #[test]
    fn test_sequence_into_non_array_warns() {
        let mut inst = sample().instantiate();
        let report = inst.load_dict(&Value::map([("a", Value::from(vec![1u8, 2]))]));
        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::NotAnArray);
        assert_eq!(inst.get("a").unwrap(), Value::U64(0));
    }

    #[test]
    fn test_missing_nested_target_is_tolerated() {
        let mut inst = sample().instantiate();
        let data = Value::map([
            ("ghost", Value::map([("x", 1u8)])),
            ("a", Value::from(7u8)),
        ]);
        let report = inst.load_dict(&data);

        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::MissingTarget);
        assert_eq!(inst.get("a").unwrap(), Value::U64(7));
    }

    #[test]
    fn test_extra_elements_are_skipped() {
        let mut inst = sample().instantiate();
        let report = inst.load_dict(&Value::map([("f", Value::from(vec![1u32, 2, 3]))]));

        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings[0].path, ".f[2]");
        assert_eq!(inst.get("f").unwrap(), Value::from(vec![1u32, 2]));
    }

    #[test]
    fn test_number_into_record_warns() {
        let mut inst = sample().instantiate();
        let report = inst.load_dict(&Value::map([("d", 1u8)]));
        assert_eq!(report.warnings[0].kind, WarningKind::NotAScalar { value: Value::U64(1) });
    }

    #[test]
    fn test_nested_unknown_does_not_stop_load() {
        let mut inst = sample().instantiate();
        let data = Value::map([
            ("d", Value::map([("invalid_field", 0x12345u32), ("d0", 1)])),
            ("a", Value::from(2u8)),
        ]);
        let report = inst.load_dict(&data);

        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings[0].path, ".d.invalid_field");
        assert_eq!(inst.get("d0").unwrap(), Value::U64(1));
        assert_eq!(inst.get("a").unwrap(), Value::U64(2));
    }

    #[test]
    fn test_overrides_win() {
        let ty = sample();
        let data = Value::map([("a", 1u16), ("lo", 2)]);
        let (inst, report) = ty.load_dict_with(&data, [("a", 5u16), ("invalid_field", 0xabcd)]);

        assert_eq!(report.len(), 1);
        assert_eq!(inst.get("a").unwrap(), Value::U64(5));
        assert_eq!(inst.get("lo").unwrap(), Value::U64(2));
    }

    #[test]
    fn test_bare_scalar_assigns_leaf() {
        let ty = structure(vec![field("a", Scalar::U8)]).unwrap();
        let mut inst = ty.instantiate();
        let report = inst.load_dict(&Value::U64(3));
        assert_eq!(report.warnings[0].kind, WarningKind::NotAScalar { value: Value::U64(3) });
    }
}
