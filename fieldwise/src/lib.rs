#![warn(missing_docs)]
//! Type-directed conversion of untyped JSON-like mappings into declared
//! record types.
//!
//! An [`Engine`] walks a record declaration field by field, hands each raw
//! value to the [`TypeParser`] registered for the field's type and threads
//! a [`FieldPath`] through every descent, so a failure deep inside nested
//! records, lists or mappings is reported exactly where it happened:
//!
//! ```
//! use fieldwise::{Engine, record};
//! use serde_json::json;
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct Item {
//!         pub email: String,
//!         pub quantity: i64,
//!     }
//! }
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct Order {
//!         pub items: Vec<Item>,
//!     }
//! }
//!
//! let engine = Engine::new();
//! let err = engine
//!     .from_value::<Order>(&json!({"items": [
//!         {"email": "a@x", "quantity": 1},
//!         {"email": "b@x", "quantity": "2"},
//!         {"email": "c@x", "quantity": "many"},
//!     ]}))
//!     .unwrap_err();
//! assert_eq!(err.as_parsing().unwrap().path, ["items", "[2]", "quantity"]);
//! ```
//!
//! Built-in parsers cover booleans, integers, floats, decimals, text,
//! date-times, lists, mappings, optional values and enumerations. Custom
//! types either register their own parser or declare a parent type whose
//! parser they inherit.

mod engine;
mod error;
mod macros;
pub mod parsers;
mod path;
mod registry;
mod ty;
mod value;

pub use engine::Engine;
pub use error::{Cause, ConvertError, Error, ParsingError, Result, SchemaError};
pub use path::{FieldPath, PathSegment};
pub use registry::{ParserRegistry, TypeParser};
pub use ty::{
    CustomType, Describe, EnumMember, EnumType, Field, IntRange, RecordType, Ty, TypeKey,
};
pub use value::{CustomValue, EnumValue, FromValue, Record, RecordValue, Value};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value as JsonValue;
}
