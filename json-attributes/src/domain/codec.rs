//! Conversion between a column's persisted text and its typed value.
//!
//! Decoding never fails. Malformed storage degrades to the model's default
//! value and is reported through [`DecodeFallback`] and a `tracing` warning,
//! so reading a legacy row cannot abort the caller.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use super::attribute_spec::json_kind;
use super::{ModelValue, SchemaModel};

/// Raw column content as handed over by the storage engine or a caller.
#[derive(Debug, Clone)]
pub enum RawColumnValue {
    /// SQL `NULL`.
    Null,
    /// JSON text.
    Text(String),
    /// JSON text as raw bytes.
    Bytes(Vec<u8>),
    /// Already parsed JSON.
    Json(Value),
    /// A typed value, e.g. assigned by application code.
    Typed(ModelValue),
}

impl From<Value> for RawColumnValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for RawColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RawColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ModelValue> for RawColumnValue {
    fn from(value: ModelValue) -> Self {
        Self::Typed(value)
    }
}

/// Value offered to the codec for persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// A typed value.
    Typed(ModelValue),
    /// Arbitrary JSON bypassing the typed model.
    Raw(Value),
}

/// Result of [`JsonColumnCodec::encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedColumn {
    /// JSON text of the declared attributes in declaration order.
    Text(String),
    /// Input that is not a value of this column's model, returned unchanged.
    Passthrough(ColumnValue),
}

impl EncodedColumn {
    /// Encoded text, if the input was a value of this column's model.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Passthrough(_) => None,
        }
    }
}

/// Why decoding fell back to the default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFallback {
    /// Stored bytes were not UTF-8.
    InvalidUtf8,
    /// Stored text was not valid JSON.
    MalformedJson {
        /// Parser message.
        message: String,
    },
    /// Stored JSON was not an object.
    NotAnObject {
        /// JSON kind that was found.
        found: &'static str,
    },
}

impl fmt::Display for DecodeFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUtf8 => f.write_str("stored value is not valid UTF-8"),
            Self::MalformedJson { message } => write!(f, "stored value is not valid JSON: {message}"),
            Self::NotAnObject { found } => write!(f, "stored value must be a JSON object, got {found}"),
        }
    }
}

/// Decoded value together with the fallback that produced it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Typed value.
    pub value: ModelValue,
    /// Set when the stored content could not be used.
    pub fallback: Option<DecodeFallback>,
}

/// Stateless codec bound to one compiled [`SchemaModel`].
#[derive(Debug, Clone)]
pub struct JsonColumnCodec {
    model: Arc<SchemaModel>,
}

impl JsonColumnCodec {
    /// Bind a codec to `model`.
    #[must_use]
    pub const fn new(model: Arc<SchemaModel>) -> Self {
        Self { model }
    }

    /// Model this codec reads and writes.
    #[must_use]
    pub const fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// Render a value for persistence.
    ///
    /// Only declared attributes are written, so undeclared legacy keys are
    /// lost once a value has passed through the typed model.
    #[must_use]
    pub fn encode(&self, value: &ColumnValue) -> EncodedColumn {
        match value {
            ColumnValue::Typed(typed) if typed.is_instance_of(&self.model) => {
                EncodedColumn::Text(Value::Object(typed.to_untyped()).to_string())
            }
            other => EncodedColumn::Passthrough(other.clone()),
        }
    }

    /// Decode stored content, substituting defaults for anything unusable.
    #[must_use]
    pub fn decode(&self, raw: RawColumnValue) -> ModelValue {
        self.decode_with_diagnostics(raw).value
    }

    /// Decode stored content and report whether a fallback was needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_attributes::domain::{
    ///     AttributeDeclarations, AttributeSet, JsonColumnCodec, OwnerTypeId, RawColumnValue,
    ///     SchemaModel,
    /// };
    /// use serde_json::json;
    ///
    /// let owner = OwnerTypeId::new("Order").expect("valid owner");
    /// let specs: AttributeSet = AttributeDeclarations::from_json(&json!({"name": {}}))
    ///     .and_then(|declarations| declarations.validate())
    ///     .expect("valid declarations")
    ///     .into_iter()
    ///     .collect();
    /// let codec = JsonColumnCodec::new(SchemaModel::compile(&owner, "data", &specs));
    ///
    /// let decoded = codec.decode_with_diagnostics(RawColumnValue::from("{\"name\":"));
    /// assert!(decoded.fallback.is_some());
    /// assert_eq!(decoded.value.get("name").and_then(|value| value.as_str()), Some(""));
    /// ```
    #[must_use]
    pub fn decode_with_diagnostics(&self, raw: RawColumnValue) -> Decoded {
        let parsed = match raw {
            RawColumnValue::Null => Ok(Map::new()),
            RawColumnValue::Typed(typed) if typed.is_instance_of(&self.model) => {
                return Decoded {
                    value: typed,
                    fallback: None,
                };
            }
            RawColumnValue::Typed(typed) => Ok(typed.to_untyped()),
            RawColumnValue::Text(text) => parse_text(&text),
            RawColumnValue::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|_| DecodeFallback::InvalidUtf8)
                .and_then(|text| parse_text(&text)),
            RawColumnValue::Json(json) => into_object(json),
        };

        match parsed {
            Ok(object) => Decoded {
                value: self.model.instantiate(&object),
                fallback: None,
            },
            Err(fallback) => {
                warn!(
                    owner = %self.model.owner(),
                    column = self.model.column(),
                    error = %fallback,
                    "stored column value could not be decoded; using defaults"
                );
                Decoded {
                    value: self.model.defaults(),
                    fallback: Some(fallback),
                }
            }
        }
    }
}

fn parse_text(text: &str) -> Result<Map<String, Value>, DecodeFallback> {
    let json = serde_json::from_str::<Value>(text).map_err(|error| DecodeFallback::MalformedJson {
        message: error.to_string(),
    })?;
    into_object(json)
}

fn into_object(json: Value) -> Result<Map<String, Value>, DecodeFallback> {
    match json {
        Value::Object(object) => Ok(object),
        Value::Null => Ok(Map::new()),
        other => Err(DecodeFallback::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

#[cfg(test)]
mod tests;
