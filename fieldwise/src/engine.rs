//! The resolution engine: walks a record declaration, dispatches every field
//! to a parser and locates failures.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Cause, Error, ParsingError, Result, SchemaError};
use crate::path::FieldPath;
use crate::registry::{ParserRegistry, TypeParser};
use crate::ty::{Describe, Ty, TypeKey};
use crate::value::{FromValue, Record, RecordValue, Value};

/// Converts untyped mappings into declared records.
///
/// Each engine owns its registry. Registering needs `&mut self`, so an
/// engine shared between threads (for example behind an [`Arc`]) is
/// read-only for as long as it is shared.
#[derive(Clone, Debug)]
pub struct Engine {
    registry: ParserRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine seeded with the built-in parsers.
    pub fn new() -> Self {
        Self::with_registry(ParserRegistry::with_builtins())
    }

    /// An engine using `registry` as is.
    pub fn with_registry(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    /// The engine's registry.
    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Installs `parser` for `key`; the last registration for a key wins.
    pub fn register_parser(
        &mut self,
        key: impl Into<TypeKey>,
        parser: impl TypeParser + 'static,
    ) -> &mut Self {
        self.registry.register(key.into(), Arc::new(parser));
        self
    }

    /// The parser registered for exactly `key`.
    pub fn lookup(&self, key: &TypeKey) -> Option<&dyn TypeParser> {
        self.registry.lookup(key)
    }

    /// Parses `mapping` into the record `T`.
    pub fn from_mapping<T: Record>(&self, mapping: &Map<String, JsonValue>) -> Result<T> {
        let record = self.from_record(mapping, &T::describe(), &FieldPath::root())?;
        Ok(T::from_record(record)?)
    }

    /// Parses `value`, which must be a mapping, into the record `T`.
    pub fn from_value<T: Record>(&self, value: &JsonValue) -> Result<T> {
        match value {
            JsonValue::Object(mapping) => self.from_mapping(mapping),
            other => Err(ParsingError::new(
                Cause::mismatch("mapping", other),
                FieldPath::root(),
                T::describe(),
            )
            .into()),
        }
    }

    /// Parses a single value of any describable type.
    pub fn parse<T: Describe + FromValue>(&self, value: &JsonValue) -> Result<T> {
        let ty = T::describe();
        let path = FieldPath::root();
        let parsed = self
            .parse_field(value, &ty, &path)
            .map_err(|err| err.locate(&path, &ty))?;
        Ok(T::from_value(parsed)?)
    }

    /// Parses every declared field of the record `ty` out of `mapping`.
    ///
    /// A field absent from the mapping is skipped if it has a default and is
    /// a missing-field error otherwise. The first failing field, in
    /// declaration order, aborts the whole record.
    pub fn from_record(
        &self,
        mapping: &Map<String, JsonValue>,
        ty: &Ty,
        path: &FieldPath,
    ) -> Result<RecordValue> {
        let Some(record) = ty.structure().as_record() else {
            return Err(SchemaError::NotARecord { ty: ty.to_string() }.into());
        };

        let mut fields = IndexMap::with_capacity(record.fields.len());
        for field in &record.fields {
            let field_path = path.field(field.name.clone());
            match mapping.get(&*field.name) {
                Some(value) => {
                    let parsed = self
                        .parse_field(value, &field.ty, &field_path)
                        .map_err(|err| err.locate(&field_path, &field.ty))?;
                    fields.insert(field.name.clone(), parsed);
                }
                None if field.has_default => {
                    tracing::trace!(path = %field_path, "absent, using default");
                }
                None => return Err(ParsingError::missing(field, field_path).into()),
            }
        }
        Ok(RecordValue::new(record.name.clone(), fields))
    }

    /// Dispatches `value` to the parser for `ty`.
    ///
    /// In order: an exact registration for `ty`; nested records, including
    /// custom types extending one; the generic head of a parameterized type;
    /// the declared ancestors, most derived first. A type matching none of
    /// these is a schema error.
    pub fn parse_field(&self, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        if let Some(parser) = self.registry.lookup(&ty.key()) {
            tracing::trace!(%path, %ty, parser = parser.name(), "exact match");
            return parser.parse(self, value, ty, path);
        }

        if let Ty::Record(_) = ty.structure() {
            tracing::trace!(%path, %ty, "nested record");
            let JsonValue::Object(mapping) = value else {
                return Err(Cause::mismatch("mapping", value).into());
            };
            return self.from_record(mapping, ty, path).map(Value::Record);
        }

        if let Some(base) = ty.base_key()
            && let Some(parser) = self.registry.lookup(&base)
        {
            tracing::trace!(%path, %ty, %base, parser = parser.name(), "generic match");
            return parser.parse(self, value, ty, path);
        }

        for ancestor in ty.ancestors() {
            if let Some(parser) = self.registry.lookup(&ancestor) {
                tracing::trace!(%path, %ty, %ancestor, parser = parser.name(), "inherited match");
                return parser.parse(self, value, ty, path);
            }
        }

        Err(Error::Schema(SchemaError::Unsupported { ty: ty.to_string() }))
    }
}
