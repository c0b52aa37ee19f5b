//! The nested mapping/sequence/number shape exchanged by `to_dict` and `load_dict`.

use std::fmt;

use indexmap::IndexMap;

/// Insertion-ordered mapping from field name to [Value].
pub type Map = IndexMap<String, Value>;

/// A number, an ordered sequence, or an ordered mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    U64(u64),
    I64(i64),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Builds a mapping value from `(key, value)` pairs, keeping their order.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::U64(_) | Value::I64(_))
    }

    /// Raw two's complement bits of a number, `None` for lists and maps.
    pub fn as_raw(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::I64(v) => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Looks up `key` if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Hexadecimal literal of a number (`0x1f`, `-0x1`); `None` for lists and maps.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            Value::U64(v) => Some(format!("{:#x}", v)),
            Value::I64(v) if *v < 0 => Some(format!("-{:#x}", v.unsigned_abs())),
            Value::I64(v) => Some(format!("{:#x}", v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U64(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}':{}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::U64(v as u64)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::I64(v as i64)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);
impl_from_signed!(i8, i16, i32, i64);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Value::U64(255).to_hex().as_deref(), Some("0xff"));
        assert_eq!(Value::I64(-1).to_hex().as_deref(), Some("-0x1"));
        assert_eq!(Value::I64(0).to_hex().as_deref(), Some("0x0"));
        assert_eq!(Value::List(vec![]).to_hex(), None);
    }

    #[test]
    fn test_map_keeps_order() {
        let v = Value::map([("d", 4u8), ("b", 2), ("a", 1)]);
        let keys: Vec<&str> = v.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["d", "b", "a"]);
    }

    #[test]
    fn test_display_nested() {
        let v = Value::map([("a", Value::from(1u8)), ("f", Value::from(vec![2u8, 3]))]);
        assert_eq!(v.to_string(), "{'a':1, 'f':[2, 3]}");
    }

    #[test]
    fn test_raw_bits_of_negative() {
        assert_eq!(Value::I64(-1).as_raw(), Some(u64::MAX));
        assert_eq!(Value::from(vec![1u8]).as_raw(), None);
    }
}
