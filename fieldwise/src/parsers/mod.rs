//! Built-in type parsers and the adapters for custom types.

mod container;
mod custom;
mod datetime;
mod enumeration;
mod optional;
mod scalar;

pub use container::{ListParser, MapParser};
pub use custom::{Constructor, Validate};
pub use datetime::DateTimeParser;
pub use enumeration::EnumParser;
pub use optional::OptionalParser;
pub use scalar::{BoolParser, DecimalParser, FloatParser, IntParser, StringParser};

use crate::error::SchemaError;
use crate::ty::Ty;

/// The error for a parser handed a type whose structure it cannot read.
fn wrong_parser(parser: &'static str, ty: &Ty) -> SchemaError {
    SchemaError::WrongParser {
        parser,
        ty: ty.to_string(),
    }
}
