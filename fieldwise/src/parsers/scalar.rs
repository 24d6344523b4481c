//! Parsers for booleans, numbers and text.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Number, Value as JsonValue};

use crate::engine::Engine;
use crate::error::{Cause, Result};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::Ty;
use crate::value::Value;

/// `"yes"`, `"true"`, `"1"` and `"no"`, `"false"`, `"0"` in any case; other
/// text is rejected. Non-text values follow truthiness: null, `false`,
/// zero and empty containers are false.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoolParser;

impl TypeParser for BoolParser {
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        let b = match value {
            JsonValue::String(s) => match s.to_lowercase().as_str() {
                "yes" | "true" | "1" => true,
                "no" | "false" | "0" => false,
                other => {
                    return Err(Cause::Type(format!("{other} is not a valid boolean value")).into());
                }
            },
            JsonValue::Null => false,
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => !is_zero(n),
            JsonValue::Array(items) => !items.is_empty(),
            JsonValue::Object(entries) => !entries.is_empty(),
        };
        Ok(Value::Bool(b))
    }
}

fn is_zero(n: &Number) -> bool {
    match (n.as_i64(), n.as_u64(), n.as_f64()) {
        (Some(i), _, _) => i == 0,
        (_, Some(u), _) => u == 0,
        (_, _, Some(f)) => f == 0.0,
        _ => false,
    }
}

/// Integers from numbers (floats truncate toward zero), booleans and
/// integer literals in text. Fractional literals in text are rejected, and
/// so are values outside the bounds the declared type carries.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntParser;

impl TypeParser for IntParser {
    fn parse(&self, _: &Engine, value: &JsonValue, ty: &Ty, _: &FieldPath) -> Result<Value> {
        let i = match value {
            JsonValue::Number(n) => number_to_int(n)?,
            JsonValue::String(s) => s.trim().parse::<i64>().map_err(|_| {
                Cause::value(format!("invalid literal for int: {s:?}"))
            })?,
            JsonValue::Bool(b) => i64::from(*b),
            other => return Err(Cause::mismatch("int", other).into()),
        };
        if let Ty::Int(range) = ty.structure()
            && !range.contains(i)
        {
            return Err(Cause::value(format!("{i} is out of range for int ({range})")).into());
        }
        Ok(Value::Int(i))
    }
}

fn number_to_int(n: &Number) -> core::result::Result<i64, Cause> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(Cause::value(format!("{n} is out of range for int")));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                Err(Cause::value(format!("{n} is out of range for int")))
            } else {
                Ok(truncated as i64)
            }
        }
        _ => Err(Cause::value(format!("cannot convert {n} to int"))),
    }
}

/// Floats from numbers, booleans and float literals in text.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatParser;

impl TypeParser for FloatParser {
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        let f = match value {
            JsonValue::Number(n) => n
                .as_f64()
                .ok_or_else(|| Cause::value(format!("cannot convert {n} to float")))?,
            JsonValue::String(s) => s.trim().parse::<f64>().map_err(|_| {
                Cause::value(format!("could not convert string to float: {s:?}"))
            })?,
            JsonValue::Bool(b) => f64::from(u8::from(*b)),
            other => return Err(Cause::mismatch("float", other).into()),
        };
        Ok(Value::Float(f))
    }
}

/// Exact decimals from integers, floats (their binary value, not their
/// shortest rendering), booleans and decimal or scientific literals in text.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecimalParser;

impl TypeParser for DecimalParser {
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        let d = match value {
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Decimal::from(i)
                } else if let Some(u) = n.as_u64() {
                    Decimal::from(u)
                } else {
                    n.as_f64()
                        .and_then(Decimal::from_f64_retain)
                        .ok_or_else(|| Cause::value(format!("cannot convert {n} to decimal")))?
                }
            }
            JsonValue::String(s) => {
                let text = s.trim();
                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .map_err(|_| Cause::value(format!("invalid literal for decimal: {s:?}")))?
            }
            JsonValue::Bool(b) => Decimal::from(u8::from(*b)),
            other => return Err(Cause::mismatch("decimal", other).into()),
        };
        Ok(Value::Decimal(d))
    }
}

/// Text as is; anything else as its canonical JSON rendering.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringParser;

impl TypeParser for StringParser {
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        let s = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(Value::String(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::IntRange;
    use serde_json::json;

    fn parse(parser: &dyn TypeParser, value: JsonValue) -> Result<Value> {
        parser.parse(&Engine::new(), &value, &Ty::int(), &FieldPath::root())
    }

    #[test]
    fn bool_accepts_its_words_in_any_case() {
        for word in ["yes", "TRUE", "1", "Yes"] {
            assert_eq!(parse(&BoolParser, json!(word)).unwrap(), Value::Bool(true));
        }
        for word in ["no", "False", "0", "NO"] {
            assert_eq!(parse(&BoolParser, json!(word)).unwrap(), Value::Bool(false));
        }
        assert!(matches!(
            parse(&BoolParser, json!("aaa")),
            Err(crate::Error::Invalid(Cause::Type(_)))
        ));
    }

    #[test]
    fn bool_follows_truthiness_for_non_text() {
        for truthy in [json!(1), json!(true), json!(1.0), json!([0]), json!({"a": 1})] {
            assert_eq!(parse(&BoolParser, truthy).unwrap(), Value::Bool(true));
        }
        for falsy in [json!(0), json!(null), json!(false), json!(0.0), json!([]), json!({})] {
            assert_eq!(parse(&BoolParser, falsy).unwrap(), Value::Bool(false));
        }
    }

    #[test]
    fn int_truncates_floats_toward_zero() {
        assert_eq!(parse(&IntParser, json!("10")).unwrap(), Value::Int(10));
        assert_eq!(parse(&IntParser, json!(10)).unwrap(), Value::Int(10));
        assert_eq!(parse(&IntParser, json!(10.1)).unwrap(), Value::Int(10));
        assert_eq!(parse(&IntParser, json!(-10.1)).unwrap(), Value::Int(-10));
        assert_eq!(parse(&IntParser, json!("-10")).unwrap(), Value::Int(-10));
        assert_eq!(parse(&IntParser, json!(" 7 ")).unwrap(), Value::Int(7));
        assert_eq!(parse(&IntParser, json!(true)).unwrap(), Value::Int(1));
    }

    #[test]
    fn int_rejects_fractional_text_and_wrong_shapes() {
        assert!(matches!(
            parse(&IntParser, json!("10.1")),
            Err(crate::Error::Invalid(Cause::Value(_)))
        ));
        assert!(matches!(
            parse(&IntParser, json!(u64::MAX)),
            Err(crate::Error::Invalid(Cause::Value(_)))
        ));
        assert!(matches!(
            parse(&IntParser, json!([1])),
            Err(crate::Error::Invalid(Cause::Type(_)))
        ));
    }

    #[test]
    fn int_respects_declared_bounds() {
        let byte = Ty::Int(IntRange::new(0, 255));
        let parse_byte = |value: JsonValue| {
            IntParser.parse(&Engine::new(), &value, &byte, &FieldPath::root())
        };
        assert_eq!(parse_byte(json!("255")).unwrap(), Value::Int(255));
        for outside in [json!(300), json!(-1), json!("256")] {
            let err = parse_byte(outside).unwrap_err();
            assert!(matches!(err, crate::Error::Invalid(Cause::Value(_))), "{err}");
        }
        insta::assert_snapshot!(
            parse_byte(json!(300)).unwrap_err().to_string(),
            @"300 is out of range for int (0..=255)"
        );
    }

    #[test]
    fn float_parses_numbers_and_text() {
        assert_eq!(parse(&FloatParser, json!("10")).unwrap(), Value::Float(10.0));
        assert_eq!(parse(&FloatParser, json!(10)).unwrap(), Value::Float(10.0));
        assert_eq!(parse(&FloatParser, json!(-10.1)).unwrap(), Value::Float(-10.1));
        assert_eq!(parse(&FloatParser, json!("-10.1")).unwrap(), Value::Float(-10.1));
        assert!(parse(&FloatParser, json!("ten")).is_err());
    }

    #[test]
    fn decimal_is_exact_for_text() {
        let exact = |s: &str| Value::Decimal(Decimal::from_str(s).unwrap());
        assert_eq!(parse(&DecimalParser, json!("10")).unwrap(), exact("10"));
        assert_eq!(parse(&DecimalParser, json!(10)).unwrap(), exact("10.0"));
        assert_eq!(parse(&DecimalParser, json!("-10.1")).unwrap(), exact("-10.1"));
        assert_eq!(parse(&DecimalParser, json!("1e3")).unwrap(), exact("1000"));

        let Value::Decimal(from_float) = parse(&DecimalParser, json!(10.1)).unwrap() else {
            panic!("expected a decimal");
        };
        assert!(Decimal::from(10) < from_float && from_float < Decimal::from_str("10.2").unwrap());
    }

    #[test]
    fn string_renders_non_text_canonically() {
        assert_eq!(
            parse(&StringParser, json!(false)).unwrap(),
            Value::String("false".into())
        );
        assert_eq!(parse(&StringParser, json!(12)).unwrap(), Value::String("12".into()));
        assert_eq!(
            parse(&StringParser, json!("Bob")).unwrap(),
            Value::String("Bob".into())
        );
    }
}
