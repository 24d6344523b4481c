//! The parser registry: which [`TypeParser`] handles which [`TypeKey`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::engine::Engine;
use crate::error::Result;
use crate::parsers;
use crate::path::FieldPath;
use crate::ty::{Ty, TypeKey};
use crate::value::Value;

/// Converts one raw value into one parsed value.
///
/// `ty` is the full declared type, so parsers for parameterized types can
/// read their type arguments; `path` locates the value and is what nested
/// calls back into the [`Engine`] should extend.
///
/// Report bad input as a [`Cause`](crate::Cause) (`Err(cause.into())`); the
/// engine attaches the location.
pub trait TypeParser: Send + Sync {
    /// Parses `value` as `ty`.
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value>;

    /// Name used in logs and schema errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> TypeParser for F
where
    F: Fn(&Engine, &JsonValue, &Ty, &FieldPath) -> Result<Value> + Send + Sync,
{
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        self(engine, value, ty, path)
    }

    fn name(&self) -> &'static str {
        "closure parser"
    }
}

/// Maps type keys to parsers. Lookups are exact; inheritance is the engine's job.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<TypeKey, Arc<dyn TypeParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in parsers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TypeKey::Bool, Arc::new(parsers::BoolParser));
        registry.register(TypeKey::Int, Arc::new(parsers::IntParser));
        registry.register(TypeKey::Float, Arc::new(parsers::FloatParser));
        registry.register(TypeKey::Decimal, Arc::new(parsers::DecimalParser));
        registry.register(TypeKey::String, Arc::new(parsers::StringParser));
        registry.register(TypeKey::DateTime, Arc::new(parsers::DateTimeParser::new()));
        registry.register(TypeKey::List, Arc::new(parsers::ListParser));
        registry.register(TypeKey::Map, Arc::new(parsers::MapParser));
        registry.register(TypeKey::Union, Arc::new(parsers::OptionalParser));
        registry.register(TypeKey::Enum, Arc::new(parsers::EnumParser));
        registry
    }

    /// Installs `parser` for `key`, returning the parser it replaced.
    pub fn register(
        &mut self,
        key: TypeKey,
        parser: Arc<dyn TypeParser>,
    ) -> Option<Arc<dyn TypeParser>> {
        tracing::debug!(%key, parser = parser.name(), "registering parser");
        self.parsers.insert(key, parser)
    }

    /// The parser registered for exactly `key`.
    pub fn lookup(&self, key: &TypeKey) -> Option<&dyn TypeParser> {
        self.parsers.get(key).map(|parser| &**parser)
    }

    /// Whether a parser is registered for exactly `key`.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.parsers.contains_key(key)
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.parsers.keys()
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.parsers
                    .iter()
                    .map(|(key, parser)| (key.to_string(), parser.name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_every_generic_key() {
        let registry = ParserRegistry::with_builtins();
        for key in [
            TypeKey::Bool,
            TypeKey::Int,
            TypeKey::Float,
            TypeKey::Decimal,
            TypeKey::String,
            TypeKey::DateTime,
            TypeKey::List,
            TypeKey::Map,
            TypeKey::Union,
            TypeKey::Enum,
        ] {
            assert!(registry.contains(&key), "missing builtin for {key}");
        }
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn lookup_is_exact() {
        let registry = ParserRegistry::with_builtins();
        assert!(registry.lookup(&TypeKey::named("list<int>")).is_none());
        assert!(registry.lookup(&TypeKey::named("Color")).is_none());
        assert!(ParserRegistry::new().is_empty());
    }

    #[test]
    fn registering_twice_replaces() {
        let mut registry = ParserRegistry::new();
        let first = registry.register(TypeKey::Int, Arc::new(parsers::IntParser));
        let second = registry.register(TypeKey::Int, Arc::new(parsers::FloatParser));
        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(
            registry.lookup(&TypeKey::Int).map(|parser| parser.name()),
            Some(parsers::FloatParser.name())
        );
    }
}
