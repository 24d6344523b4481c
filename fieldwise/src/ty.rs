//! Type descriptors.
//!
//! A [`Ty`] is built once from a declaration (usually through [`Describe`])
//! and then drives dispatch: its [`key`](Ty::key) selects an exact parser,
//! its [`base_key`](Ty::base_key) selects the parser for a parameterized
//! type, and its [`ancestors`](Ty::ancestors) give the explicit fallback
//! chain for enums and custom types.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

/// Identifies a type for parser dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// `bool`
    Bool,
    /// 64-bit signed integers
    Int,
    /// 64-bit floating point
    Float,
    /// Arbitrary-precision decimals
    Decimal,
    /// Text
    String,
    /// Timezone-aware instants
    DateTime,
    /// Generic head of every `list<T>`
    List,
    /// Generic head of every `map<K, V>`
    Map,
    /// Generic head of every `union<...>`
    Union,
    /// Generic ancestor of every enumeration
    Enum,
    /// A record, enumeration, custom type or one specific parameterized type
    Named(Cow<'static, str>),
}

impl TypeKey {
    /// Key for a type known by name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        TypeKey::Named(name.into())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Bool => f.write_str("bool"),
            TypeKey::Int => f.write_str("int"),
            TypeKey::Float => f.write_str("float"),
            TypeKey::Decimal => f.write_str("decimal"),
            TypeKey::String => f.write_str("string"),
            TypeKey::DateTime => f.write_str("datetime"),
            TypeKey::List => f.write_str("list"),
            TypeKey::Map => f.write_str("map"),
            TypeKey::Union => f.write_str("union"),
            TypeKey::Enum => f.write_str("enum"),
            TypeKey::Named(name) => f.write_str(name),
        }
    }
}

impl From<&Ty> for TypeKey {
    fn from(ty: &Ty) -> Self {
        ty.key()
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        TypeKey::Named(Cow::Borrowed(name))
    }
}

/// The declared type of a field.
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    /// `bool`
    Bool,
    /// Integer within the bounds of its Rust type
    Int(IntRange),
    /// 64-bit float
    Float,
    /// Arbitrary-precision decimal
    Decimal,
    /// Text
    String,
    /// Timezone-aware instant
    DateTime,
    /// The absent marker, only meaningful as the second member of an optional union
    None,
    /// Homogeneous sequence
    List(Box<Ty>),
    /// Key-value mapping
    Map(Box<Ty>, Box<Ty>),
    /// Union of members; only `[T, None]` is accepted by the built-in parser
    Union(Vec<Ty>),
    /// Enumeration
    Enum(Arc<EnumType>),
    /// Nested record
    Record(Arc<RecordType>),
    /// User-declared type, optionally inheriting a parent's parser
    Custom(Arc<CustomType>),
}

impl Ty {
    /// Any 64-bit signed integer.
    pub fn int() -> Self {
        Ty::Int(IntRange::I64)
    }

    /// `list<item>`
    pub fn list(item: Ty) -> Self {
        Ty::List(Box::new(item))
    }

    /// `map<key, value>`
    pub fn map(key: Ty, value: Ty) -> Self {
        Ty::Map(Box::new(key), Box::new(value))
    }

    /// The optional-value idiom: `union<inner, none>`.
    pub fn optional(inner: Ty) -> Self {
        Ty::Union(vec![inner, Ty::None])
    }

    /// A union of arbitrary members.
    pub fn union(members: impl IntoIterator<Item = Ty>) -> Self {
        Ty::Union(members.into_iter().collect())
    }

    /// Wraps a record declaration.
    pub fn record(record: RecordType) -> Self {
        Ty::Record(Arc::new(record))
    }

    /// Wraps an enumeration declaration.
    pub fn enumeration(enumeration: EnumType) -> Self {
        Ty::Enum(Arc::new(enumeration))
    }

    /// Wraps a custom type declaration.
    pub fn custom(custom: CustomType) -> Self {
        Ty::Custom(Arc::new(custom))
    }

    /// The exact dispatch key of this type.
    pub fn key(&self) -> TypeKey {
        match self {
            Ty::Bool => TypeKey::Bool,
            Ty::Int(_) => TypeKey::Int,
            Ty::Float => TypeKey::Float,
            Ty::Decimal => TypeKey::Decimal,
            Ty::String => TypeKey::String,
            Ty::DateTime => TypeKey::DateTime,
            Ty::Enum(e) => TypeKey::Named(e.name.clone()),
            Ty::Record(r) => TypeKey::Named(r.name.clone()),
            Ty::Custom(c) => TypeKey::Named(c.name.clone()),
            Ty::None | Ty::List(_) | Ty::Map(..) | Ty::Union(_) => {
                TypeKey::Named(Cow::Owned(self.to_string()))
            }
        }
    }

    /// The generic head of a parameterized type.
    pub fn base_key(&self) -> Option<TypeKey> {
        match self {
            Ty::List(_) => Some(TypeKey::List),
            Ty::Map(..) => Some(TypeKey::Map),
            Ty::Union(_) => Some(TypeKey::Union),
            _ => None,
        }
    }

    /// Keys to fall back on, most-derived first.
    pub fn ancestors(&self) -> Vec<TypeKey> {
        let mut keys = Vec::new();
        match self {
            Ty::Enum(_) => keys.push(TypeKey::Enum),
            Ty::Custom(custom) => {
                if let Some(parent) = &custom.parent {
                    keys.push(parent.key());
                    keys.extend(parent.base_key());
                    keys.extend(parent.ancestors());
                }
            }
            _ => {}
        }
        keys
    }

    /// Follows custom parents down to the first structural type.
    pub fn structure(&self) -> &Ty {
        let mut ty = self;
        while let Ty::Custom(custom) = ty {
            match &custom.parent {
                Some(parent) => ty = parent,
                None => break,
            }
        }
        ty
    }

    /// The real member of an optional union, if this is one.
    pub fn optional_inner(&self) -> Option<&Ty> {
        match self {
            Ty::Union(members) if members.len() == 2 && matches!(members[1], Ty::None) => {
                Some(&members[0])
            }
            _ => None,
        }
    }

    /// The record declaration, if this is a record.
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            Ty::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::Int(_) => f.write_str("int"),
            Ty::Float => f.write_str("float"),
            Ty::Decimal => f.write_str("decimal"),
            Ty::String => f.write_str("string"),
            Ty::DateTime => f.write_str("datetime"),
            Ty::None => f.write_str("none"),
            Ty::List(item) => write!(f, "list<{item}>"),
            Ty::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Ty::Union(members) => {
                if let Some(inner) = self.optional_inner() {
                    return write!(f, "optional<{inner}>");
                }
                f.write_str("union<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(">")
            }
            Ty::Enum(e) => f.write_str(&e.name),
            Ty::Record(r) => f.write_str(&r.name),
            Ty::Custom(c) => f.write_str(&c.name),
        }
    }
}

/// Inclusive bounds of an integer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntRange {
    /// Smallest accepted value
    pub min: i64,
    /// Largest accepted value
    pub max: i64,
}

impl IntRange {
    /// Everything an `i64` holds.
    pub const I64: IntRange = IntRange::new(i64::MIN, i64::MAX);

    /// Bounds from `min` to `max`, both included.
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// A named, ordered set of field declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordType {
    /// Name of the record
    pub name: Cow<'static, str>,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl RecordType {
    /// A record with no fields yet.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field declaration.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// One field of a [`RecordType`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Name, as looked up in the input mapping
    pub name: Cow<'static, str>,
    /// Declared type
    pub ty: Ty,
    /// Whether a missing value falls back to a declared default
    pub has_default: bool,
}

impl Field {
    /// A required field.
    pub fn new(name: impl Into<Cow<'static, str>>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
        }
    }

    /// Marks the field as having a default.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// An enumeration: named members with underlying values.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumType {
    /// Name of the enumeration
    pub name: Cow<'static, str>,
    /// Members in declaration order
    pub members: Vec<EnumMember>,
}

impl EnumType {
    /// An enumeration with no members yet.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Appends a member.
    pub fn member(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<JsonValue>) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// One member of an [`EnumType`].
#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    /// Declared name
    pub name: Cow<'static, str>,
    /// Underlying value
    pub value: JsonValue,
}

/// A user-declared type.
///
/// Declaring a `parent` lets the type be parsed by whatever handles the
/// parent until a parser is registered for the custom type itself.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomType {
    /// Name, also the exact dispatch key
    pub name: Cow<'static, str>,
    /// Type whose parser this one inherits
    pub parent: Option<Ty>,
}

impl CustomType {
    /// A custom type with no parent.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// Declares the parent type.
    pub fn extends(mut self, parent: Ty) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Types that can describe themselves as a [`Ty`].
pub trait Describe {
    /// The descriptor for `Self`.
    fn describe() -> Ty;
}

macro_rules! describe_as {
    ($ty:expr => $($t:ty),* $(,)?) => {
        $(
            impl Describe for $t {
                fn describe() -> Ty {
                    $ty
                }
            }
        )*
    };
}

describe_as!(Ty::Bool => bool);
// Bounds saturate at the i64 range parsed integers live in.
macro_rules! describe_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Describe for $t {
                fn describe() -> Ty {
                    Ty::Int(IntRange::new(
                        i64::try_from(<$t>::MIN).unwrap_or(i64::MIN),
                        i64::try_from(<$t>::MAX).unwrap_or(i64::MAX),
                    ))
                }
            }
        )*
    };
}

describe_int!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
describe_as!(Ty::Float => f32, f64);
describe_as!(Ty::Decimal => Decimal);
describe_as!(Ty::String => String);
describe_as!(Ty::DateTime => DateTime<FixedOffset>, DateTime<Utc>);

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> Ty {
        Ty::list(T::describe())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> Ty {
        Ty::optional(T::describe())
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn describe() -> Ty {
        Ty::map(K::describe(), V::describe())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> Ty {
        Ty::map(K::describe(), V::describe())
    }
}

impl<K: Describe, V: Describe, S> Describe for IndexMap<K, V, S> {
    fn describe() -> Ty {
        Ty::map(K::describe(), V::describe())
    }
}
