//! Registry of supported virtual attribute types and their coercion rules.
//!
//! The registry is closed: declarations naming anything outside
//! [`AttributeType::ALL`] fail with [`UnknownTypeError`] when they are
//! declared, never later when a record is read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::AttributeValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const SHORT_TIME_FORMAT: &str = "%H:%M";

const TRUE_WORDS: &[&str] = &["true", "t", "1", "yes", "y", "on"];
const FALSE_WORDS: &[&str] = &["false", "f", "0", "no", "n", "off"];

/// Symbolic attribute type accepted by declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// `true` / `false`.
    Boolean,
    /// UTF-8 text.
    String,
    /// Arbitrary precision decimal.
    Decimal,
    /// Calendar date.
    Date,
    /// Timestamp with offset.
    DateTime,
    /// Time of day.
    Time,
    /// Finite 64-bit float.
    Float,
    /// Signed 64-bit integer.
    Integer,
    /// Any JSON value, stored untouched.
    Object,
    /// Ordered list.
    Array,
    /// Ordered list without duplicates.
    Set,
    /// String-keyed map.
    Hash,
}

/// Raised when a declaration names a type outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown attribute type `{name}`, expected one of: {}", AttributeType::names().join(", "))]
pub struct UnknownTypeError {
    /// The rejected type name.
    pub name: String,
}

/// Raised when a value cannot be coerced into an attribute type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {found} into {target}")]
pub struct CoercionError {
    /// Type the value was coerced into.
    pub target: AttributeType,
    /// Short rendering of the rejected input.
    pub found: String,
}

impl CoercionError {
    fn new(target: AttributeType, raw: &Value) -> Self {
        let mut found = raw.to_string();
        if found.chars().count() > 64 {
            found = found.chars().take(61).collect::<String>() + "...";
        }
        Self { target, found }
    }
}

impl AttributeType {
    /// Every supported type, in registry order.
    pub const ALL: [Self; 12] = [
        Self::Boolean,
        Self::String,
        Self::Decimal,
        Self::Date,
        Self::DateTime,
        Self::Time,
        Self::Float,
        Self::Integer,
        Self::Object,
        Self::Array,
        Self::Set,
        Self::Hash,
    ];

    /// Resolve a symbolic type name.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_attributes::domain::AttributeType;
    ///
    /// assert_eq!(AttributeType::resolve("Integer"), Ok(AttributeType::Integer));
    /// assert!(AttributeType::resolve("NotAType").is_err());
    /// ```
    pub fn resolve(name: &str) -> Result<Self, UnknownTypeError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.name() == name)
            .ok_or_else(|| UnknownTypeError {
                name: name.to_owned(),
            })
    }

    /// Registry name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::Decimal => "Decimal",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Time => "Time",
            Self::Float => "Float",
            Self::Integer => "Integer",
            Self::Object => "Object",
            Self::Array => "Array",
            Self::Set => "Set",
            Self::Hash => "Hash",
        }
    }

    /// Names of every supported type.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.into_iter().map(Self::name).collect()
    }

    /// Value used when an attribute is absent and declares no default.
    #[must_use]
    pub fn zero(self) -> AttributeValue {
        match self {
            Self::Boolean => AttributeValue::Boolean(false),
            Self::String => AttributeValue::String(String::new()),
            Self::Decimal => AttributeValue::Decimal(Decimal::ZERO),
            Self::Float => AttributeValue::Float(0.0),
            Self::Integer => AttributeValue::Integer(0),
            Self::Array => AttributeValue::Array(Vec::new()),
            Self::Set => AttributeValue::Set(Vec::new()),
            Self::Hash => AttributeValue::Hash(Map::new()),
            Self::Date | Self::DateTime | Self::Time | Self::Object => AttributeValue::Null,
        }
    }

    /// Coerce a raw JSON representation into the canonical value.
    ///
    /// `null` is accepted by every type.
    pub fn parse(self, raw: &Value) -> Result<AttributeValue, CoercionError> {
        if raw.is_null() {
            return Ok(AttributeValue::Null);
        }
        let parsed = match self {
            Self::Boolean => parse_boolean(raw).map(AttributeValue::Boolean),
            Self::String => parse_string(raw).map(AttributeValue::String),
            Self::Decimal => parse_decimal(raw).map(AttributeValue::Decimal),
            Self::Date => parse_date(raw).map(AttributeValue::Date),
            Self::DateTime => parse_date_time(raw).map(AttributeValue::DateTime),
            Self::Time => parse_time(raw).map(AttributeValue::Time),
            Self::Float => parse_float(raw).map(AttributeValue::Float),
            Self::Integer => parse_integer(raw).map(AttributeValue::Integer),
            Self::Object => Some(AttributeValue::Object(raw.clone())),
            Self::Array => Some(AttributeValue::Array(parse_list(raw))),
            Self::Set => Some(AttributeValue::Set(dedup(parse_list(raw)))),
            Self::Hash => raw.as_object().cloned().map(AttributeValue::Hash),
        };
        parsed.ok_or_else(|| CoercionError::new(self, raw))
    }

    /// Coerce an already typed value, converting between variants when needed.
    ///
    /// A value of the matching variant is returned unchanged; anything else is
    /// serialized and parsed again.
    pub fn coerce(self, value: AttributeValue) -> Result<AttributeValue, CoercionError> {
        let matches_variant = matches!(
            (self, &value),
            (_, AttributeValue::Null)
                | (Self::Boolean, AttributeValue::Boolean(_))
                | (Self::String, AttributeValue::String(_))
                | (Self::Decimal, AttributeValue::Decimal(_))
                | (Self::Date, AttributeValue::Date(_))
                | (Self::DateTime, AttributeValue::DateTime(_))
                | (Self::Time, AttributeValue::Time(_))
                | (Self::Integer, AttributeValue::Integer(_))
                | (Self::Object, AttributeValue::Object(_))
                | (Self::Array, AttributeValue::Array(_))
                | (Self::Hash, AttributeValue::Hash(_))
        );
        match value {
            AttributeValue::Object(Value::Null) => Ok(AttributeValue::Null),
            _ if matches_variant => Ok(value),
            AttributeValue::Float(float) if !float.is_finite() => Err(CoercionError {
                target: self,
                found: float.to_string(),
            }),
            AttributeValue::Float(_) if self == Self::Float => Ok(value),
            AttributeValue::Set(members) if self == Self::Set => {
                Ok(AttributeValue::Set(dedup(members)))
            }
            other => self.parse(&to_json(&other)),
        }
    }

    /// Serialize a value into its persisted JSON form.
    #[must_use]
    pub fn serialize(self, value: &AttributeValue) -> Value {
        to_json(value)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// Render any attribute value as JSON.
#[must_use]
pub fn to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Boolean(flag) => Value::Bool(*flag),
        AttributeValue::String(text) => Value::String(text.clone()),
        AttributeValue::Decimal(decimal) => Value::String(decimal.to_string()),
        AttributeValue::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        AttributeValue::DateTime(timestamp) => Value::String(timestamp.to_rfc3339()),
        AttributeValue::Time(time) => Value::String(time.format(TIME_FORMAT).to_string()),
        AttributeValue::Float(float) => Number::from_f64(*float).map_or(Value::Null, Value::Number),
        AttributeValue::Integer(integer) => Value::from(*integer),
        AttributeValue::Object(raw) => raw.clone(),
        AttributeValue::Array(members) | AttributeValue::Set(members) => {
            Value::Array(members.clone())
        }
        AttributeValue::Hash(entries) => Value::Object(entries.clone()),
    }
}

fn parse_boolean(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(text) => {
            let word = text.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Some(true)
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn parse_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn parse_decimal(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_date(raw: &Value) -> Option<NaiveDate> {
    let text = raw.as_str()?.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| parse_date_time_text(text).map(|timestamp| timestamp.date_naive()))
}

fn parse_date_time(raw: &Value) -> Option<DateTime<FixedOffset>> {
    match raw {
        Value::String(text) => parse_date_time_text(text.trim()),
        Value::Number(number) => DateTime::from_timestamp(number.as_i64()?, 0)
            .map(|timestamp| timestamp.fixed_offset()),
        _ => None,
    }
}

fn parse_date_time_text(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, NAIVE_DATE_TIME_FORMAT)
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
        })
}

fn parse_time(raw: &Value) -> Option<NaiveTime> {
    let text = raw.as_str()?.trim();
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, SHORT_TIME_FORMAT))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|ts| ts.time()))
}

fn parse_float(raw: &Value) -> Option<f64> {
    let float = match raw {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    float.is_finite().then_some(float)
}

// 2^63 as f64; every integral float strictly below it fits in i64.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => number.as_i64().or_else(|| {
            number.as_f64().and_then(integral_float)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[expect(
    clippy::float_cmp,
    reason = "exact comparison detects a fractional part"
)]
#[expect(
    clippy::cast_possible_truncation,
    reason = "range checked against 2^63 before the cast"
)]
fn integral_float(float: f64) -> Option<i64> {
    let integral = float.trunc() == float && float >= -I64_UPPER_BOUND && float < I64_UPPER_BOUND;
    integral.then_some(float as i64)
}

fn parse_list(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(members) => members.clone(),
        other => vec![other.clone()],
    }
}

fn dedup(members: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(members.len());
    for member in members {
        if !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique
}
