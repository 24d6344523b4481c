//! Sequence and mapping parsers.

use serde_json::Value as JsonValue;

use super::wrong_parser;
use crate::engine::Engine;
use crate::error::{Cause, Result};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::Ty;
use crate::value::Value;

/// Parses a list element by element; element `i` is located at `path[i]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListParser;

impl TypeParser for ListParser {
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        let Ty::List(item) = ty.structure() else {
            return Err(wrong_parser(self.name(), ty).into());
        };
        let JsonValue::Array(elements) = value else {
            return Err(Cause::mismatch("list", value).into());
        };

        let mut parsed = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let element_path = path.index(i);
            let element = engine
                .parse_field(element, item, &element_path)
                .map_err(|err| err.locate(&element_path, item))?;
            parsed.push(element);
        }
        Ok(Value::List(parsed))
    }
}

/// Parses a mapping entry by entry.
///
/// Keys are parsed at the mapping's own path; each value is located under
/// its key.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapParser;

impl TypeParser for MapParser {
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        let Ty::Map(key_ty, value_ty) = ty.structure() else {
            return Err(wrong_parser(self.name(), ty).into());
        };
        let JsonValue::Object(entries) = value else {
            return Err(Cause::mismatch("mapping", value).into());
        };

        let mut parsed = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let key_value = engine
                .parse_field(&JsonValue::String(key.clone()), key_ty, path)
                .map_err(|err| err.locate(path, key_ty))?;
            let entry_path = path.key(key.as_str());
            let entry_value = engine
                .parse_field(entry, value_ty, &entry_path)
                .map_err(|err| err.locate(&entry_path, value_ty))?;
            parsed.push((key_value, entry_value));
        }
        Ok(Value::Map(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_elements_are_parsed_in_order() {
        let engine = Engine::new();
        let ty = Ty::list(Ty::int());
        let parsed = ListParser
            .parse(&engine, &json!(["1", 2, 3.9]), &ty, &FieldPath::root())
            .unwrap();
        assert_eq!(
            parsed,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn first_failing_element_is_located_by_index() {
        let engine = Engine::new();
        let ty = Ty::list(Ty::int());
        let path = FieldPath::root().field("value");
        let err = ListParser
            .parse(&engine, &json!([1, "2", "three", "four"]), &ty, &path)
            .unwrap_err();
        let err = err.as_parsing().unwrap();
        assert_eq!(err.path, ["value", "[2]"]);
        assert_eq!(err.expected, Ty::int());
    }

    #[test]
    fn non_lists_are_type_errors() {
        let engine = Engine::new();
        let err = ListParser
            .parse(&engine, &json!("bob"), &Ty::list(Ty::int()), &FieldPath::root())
            .unwrap_err();
        assert!(matches!(err, crate::Error::Invalid(Cause::Type(_))));
    }

    #[test]
    fn map_values_are_located_under_their_key() {
        let engine = Engine::new();
        let ty = Ty::map(Ty::String, Ty::int());
        let path = FieldPath::root().field("scores");

        let parsed = MapParser
            .parse(&engine, &json!({"b": "2", "a": 1}), &ty, &path)
            .unwrap();
        assert_eq!(
            parsed,
            Value::Map(vec![
                (Value::String("b".into()), Value::Int(2)),
                (Value::String("a".into()), Value::Int(1)),
            ])
        );

        let err = MapParser
            .parse(&engine, &json!({"a": 1, "b": "x"}), &ty, &path)
            .unwrap_err();
        assert_eq!(err.as_parsing().unwrap().path, ["scores", "b"]);
    }

    #[test]
    fn map_keys_fail_at_the_mapping_path() {
        let engine = Engine::new();
        let ty = Ty::map(Ty::int(), Ty::Bool);
        let path = FieldPath::root().field("flags");
        let err = MapParser
            .parse(&engine, &json!({"one": true}), &ty, &path)
            .unwrap_err();
        let err = err.as_parsing().unwrap();
        assert_eq!(err.path, ["flags"]);
        assert_eq!(err.expected, Ty::int());
    }

    #[test]
    fn wrong_structure_is_a_schema_error() {
        let engine = Engine::new();
        let err = ListParser
            .parse(&engine, &json!([]), &Ty::int(), &FieldPath::root())
            .unwrap_err();
        assert!(matches!(
            err.as_schema(),
            Some(crate::SchemaError::WrongParser { .. })
        ));
    }
}
