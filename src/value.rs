//! The value kinds understood by the binder and the materializer.

use crate::error::Error;
use chrono::{DateTime, Utc};

/// Generic key-value mapping stored in a text column through a [`MappingCodec`](crate::codec::MappingCodec).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Timestamp kind. Stored with the driver's native date-time type.
pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Integer,
    Long,
    Double,
    Text,
    Timestamp,
    Mapping,
}

/// A single bindable or extracted value.
///
/// `Text` and `Timestamp` carry an `Option` so that an absent value binds as a
/// typed SQL `NULL` instead of leaving the parameter unset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    Text(Option<String>),
    Timestamp(Option<Timestamp>),
    Mapping(Attributes),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Boolean(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::Long(_) => Kind::Long,
            Value::Double(_) => Kind::Double,
            Value::Text(_) => Kind::Text,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::Mapping(_) => Kind::Mapping,
        }
    }
}

/// A value as it is bound to a statement slot.
///
/// There is no mapping variant: mappings are encoded to `Text` with the
/// builder's codec before they are stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    Text(Option<String>),
    Timestamp(Option<Timestamp>),
}

/// Rust types that can back a described field.
pub trait FieldType: Sized {
    const KIND: Kind;

    fn into_value(self) -> Value;

    /// Returns `None` when `value` is of another kind.
    fn from_value(value: Value) -> Option<Self>;
}

/// Converts `value` into the field's type, reporting a [`Error::KindMismatch`]
/// for `field` otherwise.
pub fn extract<F: FieldType>(field: &'static str, value: Value) -> crate::Result<F> {
    let found = value.kind();
    F::from_value(value).ok_or(Error::KindMismatch {
        field,
        expected: F::KIND,
        found,
    })
}

macro_rules! impl_field_type {
    ($ty:ty, $kind:ident) => {
        impl FieldType for $ty {
            const KIND: Kind = Kind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$kind(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

impl_field_type!(bool, Boolean);
impl_field_type!(i32, Integer);
impl_field_type!(i64, Long);
impl_field_type!(f64, Double);
impl_field_type!(Option<String>, Text);
impl_field_type!(Option<Timestamp>, Timestamp);
impl_field_type!(Attributes, Mapping);

impl FieldType for String {
    const KIND: Kind = Kind::Text;

    fn into_value(self) -> Value {
        Value::Text(Some(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(value) => Some(value.unwrap_or_default()),
            _ => None,
        }
    }
}

impl FieldType for Timestamp {
    const KIND: Kind = Kind::Timestamp;

    fn into_value(self) -> Value {
        Value::Timestamp(Some(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(value) => value,
            _ => None,
        }
    }
}
