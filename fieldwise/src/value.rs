//! Parsed values and typed construction.
//!
//! The engine produces a [`Value`] tree shaped by the declared [`Ty`]. Rust
//! types pick their part of the tree back out through [`FromValue`]; records
//! do so through [`Record`].

use std::any::Any;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::error::ConvertError;
use crate::ty::{Describe, RecordType};

/// A value produced by parsing, shaped by its declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absent value of an optional field
    None,
    /// A boolean
    Bool(bool),
    /// An integer
    Int(i64),
    /// A float
    Float(f64),
    /// A decimal
    Decimal(Decimal),
    /// Text
    String(String),
    /// A timezone-aware instant
    DateTime(DateTime<FixedOffset>),
    /// Elements of a sequence, in input order
    List(Vec<Value>),
    /// Entries of a mapping, in input order
    Map(Vec<(Value, Value)>),
    /// A member of an enumeration
    Enum(EnumValue),
    /// A nested record
    Record(RecordValue),
    /// Whatever a custom parser built
    Custom(CustomValue),
}

impl Value {
    /// Short name of this value's kind, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Enum(_) => "enum",
            Value::Record(_) => "record",
            Value::Custom(_) => "custom",
        }
    }

    /// Recovers a value built by a custom parser.
    pub fn downcast<T: Any + Clone>(self) -> Result<T, ConvertError> {
        match &self {
            Value::Custom(custom) => custom
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| ConvertError::mismatch(std::any::type_name::<T>(), &self)),
            other => Err(ConvertError::mismatch(std::any::type_name::<T>(), other)),
        }
    }
}

/// The member an enum parser selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    /// Name of the enumeration
    pub enumeration: Cow<'static, str>,
    /// Declared name of the member
    pub member: Cow<'static, str>,
    /// Position of the member in the declaration
    pub index: usize,
}

/// The fields of a parsed record, in declaration order.
///
/// Fields that were absent from the input but declared with a default are
/// not present; the record's Rust type supplies the default.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordValue {
    /// Name of the record type
    pub name: Cow<'static, str>,
    /// Parsed fields
    pub fields: IndexMap<Cow<'static, str>, Value>,
}

impl RecordValue {
    /// Assembles a record.
    pub fn new(name: Cow<'static, str>, fields: IndexMap<Cow<'static, str>, Value>) -> Self {
        Self { name, fields }
    }

    /// A parsed field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Removes a field and converts it.
    pub fn take<T: FromValue>(&mut self, name: &'static str) -> Result<T, ConvertError> {
        match self.fields.shift_remove(name) {
            Some(value) => T::from_value(value),
            None => Err(ConvertError::MissingField {
                field: Cow::Borrowed(name),
            }),
        }
    }

    /// Removes a field and converts it, or falls back to `default` if it was absent.
    pub fn take_or_else<T: FromValue>(
        &mut self,
        name: &str,
        default: impl FnOnce() -> T,
    ) -> Result<T, ConvertError> {
        match self.fields.shift_remove(name) {
            Some(value) => T::from_value(value),
            None => Ok(default()),
        }
    }
}

/// Object-safe view of a custom value.
trait DynValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynValue) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// A type-erased value produced by a custom parser.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn DynValue>);

impl CustomValue {
    /// Erases `value`.
    pub fn new<T: Any + fmt::Debug + PartialEq + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the value as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let inner: &dyn DynValue = &*self.0;
        inner.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        let this: &dyn DynValue = &*self.0;
        this.dyn_eq(&*other.0)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner: &dyn DynValue = &*self.0;
        fmt::Debug::fmt(inner, f)
    }
}

/// Builds a Rust value out of a parsed [`Value`].
pub trait FromValue: Sized {
    /// Performs the conversion.
    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

/// A Rust type declared as a record.
///
/// Usually implemented through [`record!`](crate::record).
pub trait Record: Describe + FromValue {
    /// The record's field declarations.
    fn record_type() -> RecordType;

    /// Builds the Rust value from the parsed fields.
    fn from_record(record: RecordValue) -> Result<Self, ConvertError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConvertError::mismatch("bool", &other)),
        }
    }
}

macro_rules! from_int_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::Int(i) => <$t>::try_from(i).map_err(|_| ConvertError::OutOfRange {
                            message: format!("{i} does not fit in {}", stringify!($t)),
                        }),
                        other => Err(ConvertError::mismatch(stringify!($t), &other)),
                    }
                }
            }
        )*
    };
}

from_int_value!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(ConvertError::mismatch("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => Ok(f as f32),
            other => Err(ConvertError::mismatch("f32", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Decimal(d) => Ok(d),
            other => Err(ConvertError::mismatch("decimal", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(ConvertError::mismatch("string", &other)),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(ConvertError::mismatch("datetime", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        DateTime::<FixedOffset>::from_value(value).map(|dt| dt.with_timezone(&Utc))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConvertError::mismatch("list", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

fn map_entries<K: FromValue, V: FromValue>(
    value: Value,
) -> Result<impl Iterator<Item = Result<(K, V), ConvertError>>, ConvertError> {
    match value {
        Value::Map(entries) => Ok(entries
            .into_iter()
            .map(|(k, v)| -> Result<(K, V), ConvertError> {
                Ok((K::from_value(k)?, V::from_value(v)?))
            })),
        other => Err(ConvertError::mismatch("map", &other)),
    }
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        map_entries(value)?.collect()
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        map_entries(value)?.collect()
    }
}

impl<K, V, S> FromValue for IndexMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self, ConvertError> {
        map_entries(value)?.collect()
    }
}
