//! The generic parser for enumerations.

use serde_json::Value as JsonValue;

use super::wrong_parser;
use crate::engine::Engine;
use crate::error::{Cause, Result};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::{EnumMember, Ty};
use crate::value::{EnumValue, Value};

/// Selects an enumeration member.
///
/// Text is first matched case-insensitively against member names; if no
/// name matches, the raw value is matched against member values.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumParser;

impl TypeParser for EnumParser {
    fn parse(&self, _: &Engine, value: &JsonValue, ty: &Ty, _: &FieldPath) -> Result<Value> {
        let Ty::Enum(enumeration) = ty.structure() else {
            return Err(wrong_parser(self.name(), ty).into());
        };

        let by_name = value.as_str().and_then(|text| {
            let text = text.to_lowercase();
            enumeration
                .members
                .iter()
                .position(|member| member.name.to_lowercase() == text)
        });
        let index = by_name
            .or_else(|| {
                enumeration
                    .members
                    .iter()
                    .position(|member| same_value(member, value))
            })
            .ok_or_else(|| Cause::value(format!("{value} is not a valid {}", enumeration.name)))?;

        Ok(Value::Enum(EnumValue {
            enumeration: enumeration.name.clone(),
            member: enumeration.members[index].name.clone(),
            index,
        }))
    }
}

/// Value equality, with numbers compared numerically.
fn same_value(member: &EnumMember, value: &JsonValue) -> bool {
    match (&member.value, value) {
        (JsonValue::Number(a), JsonValue::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64().is_some_and(|a| b.as_f64() == Some(a)),
        },
        (a, b) => a == b,
    }
}
