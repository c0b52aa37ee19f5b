//! Reader for the mapping literals produced by [crate::render::pretty_dict].
//!
//! Accepts `{'key': value, ...}` mappings, `[value, ...]` sequences, decimal and
//! hexadecimal integers with an optional `-`, trailing commas and `#` comments.

use pest::{Parser, iterators::Pair};

use crate::{
    errors::LiteralError,
    value::{Map, Value},
};

mod grammar {
    #[derive(pest_derive::Parser)]
    #[grammar = "literal.pest"]
    pub struct LiteralParser;
}

use grammar::{LiteralParser, Rule};

/// Parses a mapping/sequence/integer literal into a [Value].
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut pairs = LiteralParser::parse(Rule::literal, input)
        .map_err(|e| LiteralError::Syntax(e.to_string()))?;
    let top = pairs
        .next()
        .ok_or_else(|| LiteralError::Syntax("empty literal".to_string()))?;
    to_value(top)
}

fn to_value(pair: Pair<'_, Rule>) -> Result<Value, LiteralError> {
    match pair.as_rule() {
        Rule::int => parse_int(pair.as_str()),
        Rule::list => pair
            .into_inner()
            .map(to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Rule::map => {
            let mut map = Map::new();
            for entry in pair.into_inner() {
                let mut parts = entry.into_inner();
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    return Err(LiteralError::Syntax("incomplete mapping entry".to_string()));
                };
                let key = key
                    .into_inner()
                    .next()
                    .map(|text| text.as_str().to_string())
                    .unwrap_or_default();
                if map.contains_key(&key) {
                    return Err(LiteralError::DuplicateKey(key));
                }
                map.insert(key, to_value(value)?);
            }
            Ok(Value::Map(map))
        }
        other => Err(LiteralError::Syntax(format!("unexpected {:?}", other))),
    }
}

fn parse_int(text: &str) -> Result<Value, LiteralError> {
    let overflow = || LiteralError::IntegerOverflow(text.to_string());

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| overflow())?;

    if !negative {
        return Ok(Value::U64(magnitude));
    }

    i64::try_from(-(magnitude as i128))
        .map(Value::I64)
        .map_err(|_| overflow())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers() {
        assert_eq!(parse("0x1f").unwrap(), Value::U64(0x1f));
        assert_eq!(parse("42").unwrap(), Value::U64(42));
        assert_eq!(parse("-0x1").unwrap(), Value::I64(-1));
        assert_eq!(parse("-0x8000000000000000").unwrap(), Value::I64(i64::MIN));
        assert_eq!(parse("0xffffffffffffffff").unwrap(), Value::U64(u64::MAX));
    }

    #[test]
    fn test_integer_overflow() {
        assert!(matches!(
            parse("0x10000000000000000"),
            Err(LiteralError::IntegerOverflow(_))
        ));
        assert!(matches!(
            parse("-0x8000000000000001"),
            Err(LiteralError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_mapping_with_trailing_commas() {
        let v = parse("{'a': 0x1,}").unwrap();
        assert_eq!(v, Value::map([("a", 1u8)]));

        let v = parse("{\n\t'a': 0x1,\n\t'b': {'c': 0x2,},\n}").unwrap();
        assert_eq!(v.get("b"), Some(&Value::map([("c", 2u8)])));
    }

    #[test]
    fn test_chunked_list_with_comments() {
        let text = concat!(
            "[0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8, 0x9,     #### 10\n",
            "\t0xa, 0xb,     #### 12\n\t]"
        );
        let v = parse(text).unwrap();
        assert_eq!(v, Value::from((0u8..12).collect::<Vec<_>>()));
    }

    #[test]
    fn test_double_quoted_keys_and_empty() {
        assert_eq!(parse("{\"x\": [], }").unwrap(), Value::map([("x", Value::List(vec![]))]));
        assert_eq!(parse("{}").unwrap(), Value::Map(Map::new()));
    }

    #[test]
    fn test_key_order_is_kept() {
        let v = parse("{'d': 4, 'b': 2, 'a': 1}").unwrap();
        let keys: Vec<&str> = v.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["d", "b", "a"]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse("{'a' 1}"), Err(LiteralError::Syntax(_))));
        assert!(matches!(parse("[1, 2"), Err(LiteralError::Syntax(_))));
        assert!(matches!(parse(""), Err(LiteralError::Syntax(_))));
        assert!(matches!(parse("{'a': 1, 'a': 2}"), Err(LiteralError::DuplicateKey(_))));
    }
}
