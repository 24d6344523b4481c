//! Declaration macros for records and enumerations.

/// Declares a struct and implements [`Record`](crate::Record),
/// [`Describe`](crate::Describe) and [`FromValue`](crate::FromValue) for it.
///
/// The descriptor is built on first use and shared afterwards.
///
/// Every field type must implement `Describe` and `FromValue`. A field
/// followed by `= expr` has a default, used when the field is absent from
/// the input.
///
/// ```
/// fieldwise::record! {
///     #[derive(Debug, PartialEq)]
///     pub struct Query {
///         pub term: String,
///         pub limit: u32 = 20,
///         pub tags: Vec<String> = Vec::new(),
///     }
/// }
///
/// let engine = fieldwise::Engine::new();
/// let query: Query = engine
///     .from_value(&serde_json::json!({"term": "rust", "limit": "5"}))
///     .unwrap();
/// assert_eq!(query.limit, 5);
/// assert!(query.tags.is_empty());
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Describe for $name {
            fn describe() -> $crate::Ty {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::Ty> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR
                    .get_or_init(|| {
                        $crate::Ty::record(<$name as $crate::Record>::record_type())
                    })
                    .clone()
            }
        }

        impl $crate::Record for $name {
            fn record_type() -> $crate::RecordType {
                $crate::RecordType::new(stringify!($name))
                $(
                    .field($crate::__record_field!(
                        $crate::Field::new(
                            stringify!($field),
                            <$ty as $crate::Describe>::describe(),
                        )
                        $(, $default)?
                    ))
                )*
            }

            fn from_record(
                #[allow(unused_mut)] mut record: $crate::RecordValue,
            ) -> ::core::result::Result<Self, $crate::ConvertError> {
                ::core::result::Result::Ok(Self {
                    $(
                        $field: $crate::__record_take!(record, $field, $ty $(, $default)?),
                    )*
                })
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(
                value: $crate::Value,
            ) -> ::core::result::Result<Self, $crate::ConvertError> {
                match value {
                    $crate::Value::Record(record) => {
                        <$name as $crate::Record>::from_record(record)
                    }
                    other => ::core::result::Result::Err(
                        $crate::ConvertError::mismatch(stringify!($name), &other),
                    ),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field {
    ($field:expr, $default:expr) => {
        $field.with_default()
    };
    ($field:expr) => {
        $field
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_take {
    ($record:ident, $field:ident, $ty:ty, $default:expr) => {
        $record.take_or_else::<$ty>(stringify!($field), || $default)?
    };
    ($record:ident, $field:ident, $ty:ty) => {
        $record.take::<$ty>(stringify!($field))?
    };
}

/// Declares a fieldless enum and implements [`Describe`](crate::Describe)
/// and [`FromValue`](crate::FromValue) for it.
///
/// Members are named after their variants. A variant followed by `= expr`
/// takes that underlying value; the others are numbered from 1 in
/// declaration order.
///
/// ```
/// fieldwise::enumeration! {
///     #[derive(Debug, PartialEq)]
///     pub enum Color {
///         Red,
///         Green,
///         Blue = "b",
///     }
/// }
///
/// let engine = fieldwise::Engine::new();
/// assert_eq!(engine.parse::<Color>(&serde_json::json!("GREEN")).unwrap(), Color::Green);
/// assert_eq!(engine.parse::<Color>(&serde_json::json!(1)).unwrap(), Color::Red);
/// assert_eq!(engine.parse::<Color>(&serde_json::json!("b")).unwrap(), Color::Blue);
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $value:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::Describe for $name {
            fn describe() -> $crate::Ty {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::Ty> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR
                    .get_or_init(|| {
                        let mut enumeration = $crate::EnumType::new(stringify!($name));
                        let mut ordinal: i64 = 0;
                        $(
                            ordinal += 1;
                            enumeration = enumeration.member(
                                stringify!($variant),
                                $crate::__enum_value!(ordinal $(, $value)?),
                            );
                        )*
                        let _ = ordinal;
                        $crate::Ty::enumeration(enumeration)
                    })
                    .clone()
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(
                value: $crate::Value,
            ) -> ::core::result::Result<Self, $crate::ConvertError> {
                match value {
                    $crate::Value::Enum(selected) => {
                        $(
                            if selected.member == stringify!($variant) {
                                return ::core::result::Result::Ok($name::$variant);
                            }
                        )*
                        ::core::result::Result::Err($crate::ConvertError::UnknownMember {
                            enumeration: stringify!($name),
                            member: selected.member.into_owned(),
                        })
                    }
                    other => ::core::result::Result::Err(
                        $crate::ConvertError::mismatch(stringify!($name), &other),
                    ),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __enum_value {
    ($ordinal:ident, $value:expr) => {
        $crate::__private::JsonValue::from($value)
    };
    ($ordinal:ident) => {
        $crate::__private::JsonValue::from($ordinal)
    };
}
