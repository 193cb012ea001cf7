//! Canonical in-memory values held by virtual attributes.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// A coerced attribute value.
///
/// Each variant is the canonical representation of one
/// [`AttributeType`](super::AttributeType); `Null` is shared by all of them
/// and represents an explicitly empty or absent value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// No value.
    Null,
    /// `Boolean` attribute.
    Boolean(bool),
    /// `String` attribute.
    String(String),
    /// `Decimal` attribute.
    Decimal(Decimal),
    /// `Date` attribute.
    Date(NaiveDate),
    /// `DateTime` attribute, keeping the original offset.
    DateTime(DateTime<FixedOffset>),
    /// `Time` attribute (time of day).
    Time(NaiveTime),
    /// `Float` attribute; always finite.
    Float(f64),
    /// `Integer` attribute.
    Integer(i64),
    /// `Object` attribute holding arbitrary JSON.
    Object(Value),
    /// `Array` attribute.
    Array(Vec<Value>),
    /// `Set` attribute; members are unique and keep first-seen order.
    Set(Vec<Value>),
    /// `Hash` attribute.
    Hash(Map<String, Value>),
}

impl AttributeValue {
    /// Returns true for [`AttributeValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the value as a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrow the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Read the value as an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the value as a float.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the value as a decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the value as a calendar date.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the value as a timestamp.
    #[must_use]
    pub const fn as_date_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Read the value as a time of day.
    #[must_use]
    pub const fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrow list members for `Array` and `Set` values.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) | Self::Set(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Borrow the entries of a `Hash` value.
    #[must_use]
    pub const fn as_hash(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Hash(values) => Some(values),
            _ => None,
        }
    }

    /// Short variant label used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "Boolean",
            Self::String(_) => "String",
            Self::Decimal(_) => "Decimal",
            Self::Date(_) => "Date",
            Self::DateTime(_) => "DateTime",
            Self::Time(_) => "Time",
            Self::Float(_) => "Float",
            Self::Integer(_) => "Integer",
            Self::Object(_) => "Object",
            Self::Array(_) => "Array",
            Self::Set(_) => "Set",
            Self::Hash(_) => "Hash",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for AttributeValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<FixedOffset>> for AttributeValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveTime> for AttributeValue {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<Map<String, Value>> for AttributeValue {
    fn from(value: Map<String, Value>) -> Self {
        Self::Hash(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
