//! Error types.
//!
//! Two families: data defects ([`ParsingError`], recoverable per call) and
//! schema defects ([`SchemaError`], a configuration problem no input can fix).
//! Type parsers report low-level failures as a [`Cause`]; the engine locates
//! each cause exactly once, at the innermost boundary that knows its path.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value as JsonValue;

use crate::path::FieldPath;
use crate::ty::{Field, Ty};
use crate::value::Value;

/// A low-level conversion failure, not yet tied to a location.
#[derive(Clone, Debug, PartialEq)]
pub enum Cause {
    /// The value has an acceptable shape but cannot be converted
    Value(String),
    /// The value has the wrong shape for the declared type
    Type(String),
    /// A required field is absent
    Missing,
}

impl Cause {
    /// A value error.
    pub fn value(message: impl Into<String>) -> Self {
        Cause::Value(message.into())
    }

    /// A type error stating what was expected and what was found.
    pub fn mismatch(expected: &str, got: &JsonValue) -> Self {
        Cause::Type(format!("expected {expected}, got {}", json_kind(got)))
    }

    /// Whether this is a [`Cause::Value`].
    pub fn is_value_error(&self) -> bool {
        matches!(self, Cause::Value(_))
    }

    /// Whether this is a [`Cause::Type`].
    pub fn is_type_error(&self) -> bool {
        matches!(self, Cause::Type(_))
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Value(message) | Cause::Type(message) => f.write_str(message),
            Cause::Missing => f.write_str("missing required field"),
        }
    }
}

impl std::error::Error for Cause {}

impl From<String> for Cause {
    fn from(message: String) -> Self {
        Cause::Value(message)
    }
}

/// Name of the JSON shape of `value`, for messages.
pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "mapping",
    }
}

/// A data defect, located at the field that failed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsingError {
    /// Human-readable description
    pub message: String,
    /// The underlying failure
    pub cause: Cause,
    /// Where the failure happened
    pub path: FieldPath,
    /// The type that was being parsed
    pub expected: Ty,
}

impl ParsingError {
    /// Locates `cause` at `path`.
    pub fn new(cause: Cause, path: FieldPath, expected: Ty) -> Self {
        let message = cause.to_string();
        tracing::debug!(%path, %expected, %message, "parsing error");
        Self {
            message,
            cause,
            path,
            expected,
        }
    }

    /// A required field is missing from the mapping.
    pub fn missing(field: &Field, path: FieldPath) -> Self {
        let message = format!("field `{}` missing", field.name);
        tracing::debug!(%path, expected = %field.ty, "missing field");
        Self {
            message,
            cause: Cause::Missing,
            path,
            expected: field.ty.clone(),
        }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "at {}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ParsingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// A schema or configuration defect.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaError {
    /// `from_record` was handed a descriptor that is not a record
    NotARecord {
        /// The offending type
        ty: String,
    },
    /// No parser matches the type at any dispatch step
    Unsupported {
        /// The offending type
        ty: String,
    },
    /// A union that is not `[T, None]`
    UnsupportedUnion {
        /// The offending type
        ty: String,
    },
    /// A parser was dispatched a type whose structure it cannot read
    WrongParser {
        /// Parser name
        parser: &'static str,
        /// The offending type
        ty: String,
    },
    /// The parsed value did not fit the Rust type it was declared for
    Convert(ConvertError),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::NotARecord { ty } => write!(f, "{ty} is not a record type"),
            SchemaError::Unsupported { ty } => write!(f, "type {ty} is not supported"),
            SchemaError::UnsupportedUnion { ty } => {
                write!(f, "unions of this shape are not allowed: {ty}")
            }
            SchemaError::WrongParser { parser, ty } => {
                write!(f, "{parser} cannot parse type {ty}")
            }
            SchemaError::Convert(err) => write!(f, "typed construction failed: {err}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::Convert(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure to build a Rust value out of a parsed [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConvertError {
    /// The parsed value has a different kind than the Rust type needs
    TypeMismatch {
        /// What the Rust type needs
        expected: &'static str,
        /// What the value is
        got: &'static str,
    },
    /// A non-defaulted field is absent from the parsed record
    MissingField {
        /// Field name
        field: Cow<'static, str>,
    },
    /// A number does not fit the Rust integer type
    OutOfRange {
        /// Description of the overflow
        message: String,
    },
    /// The enum member is unknown to the Rust enum
    UnknownMember {
        /// Name of the enumeration
        enumeration: &'static str,
        /// The member that was parsed
        member: String,
    },
}

impl ConvertError {
    /// A kind mismatch between `expected` and `got`.
    pub fn mismatch(expected: &'static str, got: &Value) -> Self {
        ConvertError::TypeMismatch {
            expected,
            got: got.kind(),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            ConvertError::MissingField { field } => write!(f, "field `{field}` was not parsed"),
            ConvertError::OutOfRange { message } => write!(f, "out of range: {message}"),
            ConvertError::UnknownMember {
                enumeration,
                member,
            } => write!(f, "{enumeration} has no member {member}"),
        }
    }
}

impl std::error::Error for ConvertError {}

/// Every failure the engine can report.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A low-level failure that has not reached a field boundary yet
    Invalid(Cause),
    /// A located data defect
    Parsing(ParsingError),
    /// A schema defect
    Schema(SchemaError),
}

impl Error {
    /// The located data defect, if this is one.
    pub fn as_parsing(&self) -> Option<&ParsingError> {
        match self {
            Error::Parsing(err) => Some(err),
            _ => None,
        }
    }

    /// The schema defect, if this is one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            Error::Schema(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the input, rather than the schema, is at fault.
    pub fn is_data_defect(&self) -> bool {
        matches!(self, Error::Invalid(_) | Error::Parsing(_))
    }

    /// Ties an unlocated cause to `path`; located errors pass through unchanged.
    pub fn locate(self, path: &FieldPath, expected: &Ty) -> Self {
        match self {
            Error::Invalid(cause) => {
                Error::Parsing(ParsingError::new(cause, path.clone(), expected.clone()))
            }
            located => located,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(cause) => write!(f, "{cause}"),
            Error::Parsing(err) => write!(f, "{err}"),
            Error::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Invalid(cause) => Some(cause),
            Error::Parsing(err) => Some(err),
            Error::Schema(err) => Some(err),
        }
    }
}

impl From<Cause> for Error {
    fn from(cause: Cause) -> Self {
        Error::Invalid(cause)
    }
}

impl From<ParsingError> for Error {
    fn from(err: ParsingError) -> Self {
        Error::Parsing(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<ConvertError> for Error {
    fn from(err: ConvertError) -> Self {
        Error::Schema(SchemaError::Convert(err))
    }
}

/// Result type for engine operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(feature = "miette")]
impl miette::Diagnostic for ParsingError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("fieldwise::parsing"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("expected a value of type {}", self.expected)))
    }
}

#[cfg(feature = "miette")]
impl miette::Diagnostic for SchemaError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("fieldwise::schema"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_wraps_causes_once() {
        let path = FieldPath::root().field("count");
        let located = Error::from(Cause::value("bad")).locate(&path, &Ty::int());
        let again = located.clone().locate(&FieldPath::root().field("outer"), &Ty::Bool);

        assert_eq!(located, again);
        let err = again.as_parsing().unwrap();
        assert_eq!(err.path, ["count"]);
        assert_eq!(err.expected, Ty::int());
        assert!(err.cause.is_value_error());
    }

    #[test]
    fn parsing_errors_render_their_path() {
        let err = ParsingError::new(
            Cause::mismatch("list", &JsonValue::from("bob")),
            FieldPath::root().field("value"),
            Ty::list(Ty::int()),
        );
        insta::assert_snapshot!(err.to_string(), @"at value: expected list, got string");
    }

    #[test]
    fn only_schema_errors_are_not_data_defects() {
        assert!(Error::from(Cause::Missing).is_data_defect());
        assert!(
            !Error::from(SchemaError::Unsupported {
                ty: "Widget".into()
            })
            .is_data_defect()
        );
    }
}
