//! The parser for optional values.

use serde_json::Value as JsonValue;

use crate::engine::Engine;
use crate::error::{Result, SchemaError};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::Ty;
use crate::value::Value;

/// Parses `union<T, none>`: null becomes [`Value::None`] without consulting
/// `T`'s parser, anything else is parsed as `T` at the same path.
///
/// Every other union shape is a schema error.
#[derive(Clone, Copy, Debug, Default)]
pub struct OptionalParser;

impl TypeParser for OptionalParser {
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        let Some(inner) = ty.structure().optional_inner() else {
            return Err(SchemaError::UnsupportedUnion { ty: ty.to_string() }.into());
        };
        if value.is_null() {
            return Ok(Value::None);
        }
        engine.parse_field(value, inner, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Cause;
    use crate::ty::TypeKey;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn null_short_circuits() {
        let engine = Engine::new();
        let ty = Ty::optional(Ty::int());
        let path = FieldPath::root().field("limit");
        assert_eq!(
            OptionalParser.parse(&engine, &json!(null), &ty, &path).unwrap(),
            Value::None
        );
        assert_eq!(
            OptionalParser.parse(&engine, &json!("5"), &ty, &path).unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn null_never_reaches_the_inner_parser() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut engine = Engine::new();
        engine.register_parser(
            TypeKey::Int,
            move |_: &Engine, _: &JsonValue, _: &Ty, _: &FieldPath| -> Result<Value> {
                seen.fetch_add(1, Ordering::SeqCst);
                Err(Cause::value("rejects everything").into())
            },
        );
        let ty = Ty::optional(Ty::int());
        let path = FieldPath::root().field("limit");

        assert_eq!(
            engine.parse_field(&json!(null), &ty, &path).unwrap(),
            Value::None
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(engine.parse_field(&json!(5), &ty, &path).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inner_failures_are_left_for_the_caller_to_locate() {
        let engine = Engine::new();
        let ty = Ty::optional(Ty::int());
        let err = OptionalParser
            .parse(&engine, &json!([1]), &ty, &FieldPath::root().field("limit"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Invalid(Cause::Type(_))));
    }

    #[test]
    fn other_union_shapes_are_rejected() {
        let engine = Engine::new();
        for ty in [
            Ty::union([]),
            Ty::union([Ty::int()]),
            Ty::union([Ty::int(), Ty::String]),
            Ty::union([Ty::None, Ty::int()]),
            Ty::union([Ty::int(), Ty::None, Ty::String]),
        ] {
            let err = OptionalParser
                .parse(&engine, &json!(null), &ty, &FieldPath::root())
                .unwrap_err();
            assert!(
                matches!(err.as_schema(), Some(SchemaError::UnsupportedUnion { .. })),
                "{ty} should be rejected"
            );
        }
    }
}
