//! Adapters for user-defined parsers.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;

use crate::engine::Engine;
use crate::error::{Cause, Result};
use crate::path::FieldPath;
use crate::registry::TypeParser;
use crate::ty::Ty;
use crate::value::{CustomValue, Value};

/// Turns a fallible constructor into a parser.
///
/// The constructor receives the raw value; its error becomes the field's
/// parsing error and its output is stored as a [`Value::Custom`].
///
/// ```
/// use fieldwise::{Cause, Engine, parsers::Constructor};
/// use serde_json::Value as JsonValue;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Email(String);
///
/// fn email(raw: &JsonValue) -> Result<Email, Cause> {
///     match raw.as_str() {
///         Some(s) if s.contains('@') => Ok(Email(s.to_owned())),
///         Some(s) => Err(Cause::value(format!("{s:?} is not an email address"))),
///         None => Err(Cause::mismatch("text", raw)),
///     }
/// }
///
/// let mut engine = Engine::new();
/// engine.register_parser("Email", Constructor::new(email));
/// ```
pub struct Constructor<F, T, E> {
    build: F,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<F, T, E> Constructor<F, T, E>
where
    F: Fn(&JsonValue) -> core::result::Result<T, E>,
{
    /// Wraps `build`.
    pub fn new(build: F) -> Self {
        Self {
            build,
            _marker: PhantomData,
        }
    }
}

impl<F, T, E> fmt::Debug for Constructor<F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("output", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<F, T, E> TypeParser for Constructor<F, T, E>
where
    F: Fn(&JsonValue) -> core::result::Result<T, E> + Send + Sync,
    T: Any + fmt::Debug + PartialEq + Send + Sync,
    E: Into<Cause>,
{
    fn parse(&self, _: &Engine, value: &JsonValue, _: &Ty, _: &FieldPath) -> Result<Value> {
        match (self.build)(value) {
            Ok(built) => Ok(Value::Custom(CustomValue::new(built))),
            Err(err) => {
                let cause: Cause = err.into();
                Err(cause.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Runs another parser, then rejects results that fail a predicate.
///
/// A rejection is a value error carrying `message`.
pub struct Validate<P, F> {
    inner: P,
    check: F,
    message: Cow<'static, str>,
}

impl<P, F> Validate<P, F>
where
    P: TypeParser,
    F: Fn(&Value) -> bool,
{
    /// Wraps `inner` with `check`.
    pub fn new(inner: P, check: F, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner,
            check,
            message: message.into(),
        }
    }
}

impl<P: fmt::Debug, F> fmt::Debug for Validate<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validate")
            .field("inner", &self.inner)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl<P, F> TypeParser for Validate<P, F>
where
    P: TypeParser,
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn parse(&self, engine: &Engine, value: &JsonValue, ty: &Ty, path: &FieldPath) -> Result<Value> {
        let parsed = self.inner.parse(engine, value, ty, path)?;
        if (self.check)(&parsed) {
            Ok(parsed)
        } else {
            Err(Cause::value(self.message.clone()).into())
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
