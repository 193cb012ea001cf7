//! Declared virtual attributes and their validation.
//!
//! An [`AttributeSpec`] is only ever built through [`AttributeSpec::validate`],
//! so every spec held by a binding has a legal name, a registered type and a
//! default that coerces to that type.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::{AttributeType, AttributeValue, CoercionError};

/// Option keys accepted for each attribute.
pub const ALLOWED_OPTION_KEYS: &[&str] = &["type", "validates", "default"];

static ATTRIBUTE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn attribute_name_regex() -> &'static Regex {
    ATTRIBUTE_NAME_RE.get_or_init(|| {
        Regex::new("^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|error| panic!("attribute name regex failed to compile: {error}"))
    })
}

/// Validation errors raised while building attribute specs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The attribute name is empty, contains whitespace or is not an identifier.
    #[error("attribute name `{name}` is invalid: {reason}")]
    InvalidName {
        /// Rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
    /// The declared type is not registered.
    #[error("attribute `{attribute}`: {source}")]
    UnknownType {
        /// Attribute being declared.
        attribute: String,
        /// Registry lookup failure.
        source: super::UnknownTypeError,
    },
    /// An option key outside [`ALLOWED_OPTION_KEYS`] was supplied.
    #[error("attribute `{attribute}`: unknown option `{option}`, valid options are: type, validates, default")]
    InvalidOption {
        /// Attribute being declared.
        attribute: String,
        /// Rejected option key.
        option: String,
    },
    /// The options for one attribute were not a JSON object.
    #[error("attribute `{attribute}`: options must be an object, got {found}")]
    InvalidOptions {
        /// Attribute being declared.
        attribute: String,
        /// JSON kind that was supplied instead.
        found: &'static str,
    },
    /// The attribute declarations as a whole were not a JSON object.
    #[error("attribute declarations must be an object of name to options, got {found}")]
    InvalidDeclarations {
        /// JSON kind that was supplied instead.
        found: &'static str,
    },
    /// A literal default does not coerce into the declared type.
    #[error("attribute `{attribute}`: invalid default: {source}")]
    InvalidDefault {
        /// Attribute being declared.
        attribute: String,
        /// Coercion failure for the default.
        source: CoercionError,
    },
}

impl SpecError {
    /// Snake-case label of the variant, for structured logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "invalid_name",
            Self::UnknownType { .. } => "unknown_type",
            Self::InvalidOption { .. } => "invalid_option",
            Self::InvalidOptions { .. } => "invalid_options",
            Self::InvalidDeclarations { .. } => "invalid_declarations",
            Self::InvalidDefault { .. } => "invalid_default",
        }
    }
}

/// Validated attribute identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeName(String);

impl AttributeName {
    /// Validate and construct an attribute name.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_attributes::domain::AttributeName;
    ///
    /// assert!(AttributeName::new("shipping_address").is_ok());
    /// assert!(AttributeName::new("shipping address").is_err());
    /// ```
    pub fn new(name: impl AsRef<str>) -> Result<Self, SpecError> {
        let raw = name.as_ref();
        let reason = if raw.is_empty() {
            Some("must not be empty")
        } else if raw.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else if !attribute_name_regex().is_match(raw) {
            Some("must be a valid identifier")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(SpecError::InvalidName {
                name: raw.to_owned(),
                reason,
            }),
            None => Ok(Self(raw.to_owned())),
        }
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function producing a fresh default for each new value.
#[derive(Clone)]
pub struct DefaultGenerator(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultGenerator {
    /// Wrap a generator closure.
    #[must_use]
    pub fn new(generator: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(generator))
    }

    /// Produce a raw default value.
    #[must_use]
    pub fn generate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DefaultGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultGenerator(..)")
    }
}

impl PartialEq for DefaultGenerator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Declared default for an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Literal raw value.
    Value(Value),
    /// Generator evaluated for each new value.
    Generator(DefaultGenerator),
}

/// Opaque validation rule forwarded to the validation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule(Value);

impl ValidationRule {
    /// Wrap a rule description.
    #[must_use]
    pub const fn new(rule: Value) -> Self {
        Self(rule)
    }

    /// Borrow the rule description.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Unvalidated options for one attribute declaration.
///
/// # Examples
///
/// ```
/// use json_attributes::domain::AttributeOptions;
/// use serde_json::json;
///
/// let options = AttributeOptions::new()
///     .with_type("Integer")
///     .with_default(json!(0))
///     .with_validation(json!({"numericality": {"greater_than_or_equal_to": 0}}));
/// assert_eq!(options.type_name(), Some("Integer"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeOptions {
    type_name: Option<String>,
    validation: Option<ValidationRule>,
    default: Option<DefaultValue>,
}

impl AttributeOptions {
    /// Options with no type (defaults to `String`), default or validation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbolic type name.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set a literal default.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(DefaultValue::Value(default));
        self
    }

    /// Set a generated default.
    #[must_use]
    pub fn with_default_fn(mut self, generator: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Generator(DefaultGenerator::new(generator)));
        self
    }

    /// Attach a validation rule description.
    #[must_use]
    pub fn with_validation(mut self, rule: Value) -> Self {
        self.validation = Some(ValidationRule::new(rule));
        self
    }

    /// Declared type name, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Parse options from untyped JSON.
    ///
    /// Keys are restricted to [`ALLOWED_OPTION_KEYS`]; a JSON `null` for a key
    /// counts as absent.
    pub fn from_json(attribute: &str, raw: &Value) -> Result<Self, SpecError> {
        let object = raw.as_object().ok_or_else(|| SpecError::InvalidOptions {
            attribute: attribute.to_owned(),
            found: json_kind(raw),
        })?;
        if let Some(option) = object
            .keys()
            .find(|key| !ALLOWED_OPTION_KEYS.contains(&key.as_str()))
        {
            return Err(SpecError::InvalidOption {
                attribute: attribute.to_owned(),
                option: option.clone(),
            });
        }

        let type_name = match object.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => Some(other.to_string()),
        };
        let validation = object
            .get("validates")
            .filter(|rule| !rule.is_null())
            .cloned()
            .map(ValidationRule::new);
        let default = object
            .get("default")
            .filter(|value| !value.is_null())
            .cloned()
            .map(DefaultValue::Value);

        Ok(Self {
            type_name,
            validation,
            default,
        })
    }
}

/// A validated virtual attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    name: AttributeName,
    attribute_type: AttributeType,
    default: Option<DefaultValue>,
    literal_default: Option<AttributeValue>,
    validation: Option<ValidationRule>,
}

impl AttributeSpec {
    /// Validate a name and its options into a spec.
    ///
    /// A missing type defaults to `String`.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_attributes::domain::{AttributeOptions, AttributeSpec, AttributeType};
    /// use serde_json::json;
    ///
    /// let spec = AttributeSpec::validate(
    ///     "count",
    ///     AttributeOptions::new().with_type("Integer").with_default(json!(5)),
    /// )
    /// .expect("valid spec");
    /// assert_eq!(spec.attribute_type(), AttributeType::Integer);
    /// assert_eq!(spec.default_value().as_i64(), Some(5));
    /// ```
    pub fn validate(name: impl AsRef<str>, options: AttributeOptions) -> Result<Self, SpecError> {
        let name = AttributeName::new(name)?;
        let attribute_type = match options.type_name.as_deref() {
            None => AttributeType::String,
            Some(type_name) => {
                AttributeType::resolve(type_name).map_err(|source| SpecError::UnknownType {
                    attribute: name.to_string(),
                    source,
                })?
            }
        };
        let literal_default = match &options.default {
            Some(DefaultValue::Value(raw)) => Some(attribute_type.parse(raw).map_err(|source| {
                SpecError::InvalidDefault {
                    attribute: name.to_string(),
                    source,
                }
            })?),
            Some(DefaultValue::Generator(_)) | None => None,
        };

        Ok(Self {
            name,
            attribute_type,
            default: options.default,
            literal_default,
            validation: options.validation,
        })
    }

    /// Attribute name.
    #[must_use]
    pub const fn name(&self) -> &AttributeName {
        &self.name
    }

    /// Resolved type.
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Declared default, if any.
    #[must_use]
    pub const fn declared_default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Declared validation rule, if any.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationRule> {
        self.validation.as_ref()
    }

    /// Value used when the attribute is absent from input.
    ///
    /// Generators run on every call; a generated value that does not coerce
    /// is logged and replaced by the type's zero value.
    #[must_use]
    pub fn default_value(&self) -> AttributeValue {
        match (&self.literal_default, &self.default) {
            (Some(value), _) => value.clone(),
            (None, Some(DefaultValue::Generator(generator))) => {
                let raw = generator.generate();
                self.attribute_type.parse(&raw).unwrap_or_else(|error| {
                    warn!(
                        attribute = %self.name,
                        error = %error,
                        "generated default does not coerce; using zero value"
                    );
                    self.attribute_type.zero()
                })
            }
            _ => self.attribute_type.zero(),
        }
    }
}

/// Insertion-ordered set of specs where a re-declared name replaces the
/// earlier spec in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    specs: Vec<AttributeSpec>,
}

impl AttributeSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// Insert or replace one spec, keeping first-seen order.
    pub fn upsert(&mut self, spec: AttributeSpec) {
        match self.position(spec.name().as_str()) {
            Some(index) => {
                if let Some(slot) = self.specs.get_mut(index) {
                    *slot = spec;
                }
            }
            None => self.specs.push(spec),
        }
    }

    /// Merge another batch of specs (last write wins).
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = AttributeSpec>) {
        for spec in incoming {
            self.upsert(spec);
        }
    }

    /// Index of an attribute in declaration order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.specs
            .iter()
            .position(|spec| spec.name().as_str() == name)
    }

    /// Look up a spec by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.specs.iter().find(|spec| spec.name().as_str() == name)
    }

    /// Whether the set declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Attribute names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name().as_str()).collect()
    }

    /// Iterate specs in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeSpec> {
        self.specs.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no attribute is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a AttributeSpec;
    type IntoIter = std::slice::Iter<'a, AttributeSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<AttributeSpec> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = AttributeSpec>>(iter: T) -> Self {
        let mut set = Self::new();
        set.merge(iter);
        set
    }
}

/// Ordered attribute declarations as handed to the declaration entry point.
///
/// # Examples
///
/// ```
/// use json_attributes::domain::AttributeDeclarations;
/// use serde_json::json;
///
/// let declarations = AttributeDeclarations::from_json(&json!({
///     "name": {"type": "String"},
///     "age": {"type": "Integer", "default": 0},
/// }))
/// .expect("valid declarations");
/// assert_eq!(declarations.names(), vec!["name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDeclarations {
    entries: Vec<(String, AttributeOptions)>,
}

impl AttributeDeclarations {
    /// No declarations.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append one declaration.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, options: AttributeOptions) -> Self {
        self.entries.push((name.into(), options));
        self
    }

    /// Parse declarations from a JSON object of name to options.
    pub fn from_json(raw: &Value) -> Result<Self, SpecError> {
        let object = raw.as_object().ok_or(SpecError::InvalidDeclarations {
            found: json_kind(raw),
        })?;
        let entries = object
            .iter()
            .map(|(name, options)| {
                AttributeOptions::from_json(name, options).map(|parsed| (name.clone(), parsed))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Rebuild declarations from already validated specs.
    #[must_use]
    pub fn from_specs(specs: &AttributeSet) -> Self {
        let entries = specs
            .iter()
            .map(|spec| {
                let options = AttributeOptions {
                    type_name: Some(spec.attribute_type().name().to_owned()),
                    validation: spec.validation().cloned(),
                    default: spec.declared_default().cloned(),
                };
                (spec.name().to_string(), options)
            })
            .collect();
        Self { entries }
    }

    /// Validate every declaration, stopping at the first error.
    pub fn validate(&self) -> Result<Vec<AttributeSpec>, SpecError> {
        self.entries
            .iter()
            .map(|(name, options)| AttributeSpec::validate(name, options.clone()))
            .collect()
    }

    /// Declared names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, AttributeOptions)> for AttributeDeclarations {
    fn from_iter<T: IntoIterator<Item = (N, AttributeOptions)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, options)| (name.into(), options))
                .collect(),
        }
    }
}

pub(crate) const fn json_kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;
