//! Typed value model compiled from one column's attribute set.
//!
//! A [`SchemaModel`] is the descriptor (ordered specs plus derived type name);
//! a [`ModelValue`] is one instance holding a value per attribute, stored by
//! index in declaration order.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::{AttributeSet, AttributeSpec, AttributeType, AttributeValue, CoercionError, OwnerTypeId};

/// Errors raised when reading or writing a single attribute of a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelValueError {
    /// The attribute is not part of the model.
    #[error("{model} has no attribute `{attribute}`")]
    UnknownAttribute {
        /// Model type name.
        model: String,
        /// Requested attribute.
        attribute: String,
    },
    /// The supplied value does not coerce into the attribute's type.
    #[error("attribute `{attribute}`: {source}")]
    Coercion {
        /// Attribute being written.
        attribute: String,
        /// Underlying coercion failure.
        source: CoercionError,
    },
}

/// Compiled descriptor for the attributes packed into one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    type_name: String,
    owner: OwnerTypeId,
    column: String,
    attributes: AttributeSet,
}

impl SchemaModel {
    /// Compile the model for `(owner, column)` from a merged attribute set.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_attributes::domain::{
    ///     AttributeOptions, AttributeSet, AttributeSpec, OwnerTypeId, SchemaModel,
    /// };
    ///
    /// let owner = OwnerTypeId::new("Order").expect("valid owner");
    /// let attributes: AttributeSet = [AttributeSpec::validate("name", AttributeOptions::new())
    ///     .expect("valid spec")]
    /// .into_iter()
    /// .collect();
    /// let model = SchemaModel::compile(&owner, "extra_info", &attributes);
    /// assert_eq!(model.type_name(), "ExtraInfoDynamicType");
    /// ```
    #[must_use]
    pub fn compile(owner: &OwnerTypeId, column: &str, attributes: &AttributeSet) -> Arc<Self> {
        Arc::new(Self {
            type_name: dynamic_type_name(column),
            owner: owner.clone(),
            column: column.to_owned(),
            attributes: attributes.clone(),
        })
    }

    /// Deterministic type name, e.g. `DataDynamicType`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Owning record type.
    #[must_use]
    pub const fn owner(&self) -> &OwnerTypeId {
        &self.owner
    }

    /// Column holding the packed attributes.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_str()
    }

    /// Attribute specs in declaration order.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Name and type of every attribute, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> Vec<(&str, AttributeType)> {
        self.attributes
            .iter()
            .map(|spec| (spec.name().as_str(), spec.attribute_type()))
            .collect()
    }

    /// Whether two models describe the same owner, column and attribute shape.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.owner == other.owner && self.column == other.column && self.describe() == other.describe()
    }

    /// Build a value with every attribute at its default.
    #[must_use]
    pub fn defaults(self: &Arc<Self>) -> ModelValue {
        self.instantiate(&Map::new())
    }

    /// Build a value from an untyped mapping.
    ///
    /// Never fails: unknown keys are ignored, missing keys take the declared
    /// default or the type's zero value, and values that do not coerce are
    /// logged and replaced the same way.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>, input: &Map<String, Value>) -> ModelValue {
        let values = self
            .attributes
            .iter()
            .map(|spec| match input.get(spec.name().as_str()) {
                None => spec.default_value(),
                Some(raw) => self.coerce_or_default(spec, raw),
            })
            .collect();
        ModelValue {
            model: Arc::clone(self),
            values,
        }
    }

    fn coerce_or_default(&self, spec: &AttributeSpec, raw: &Value) -> AttributeValue {
        spec.attribute_type().parse(raw).unwrap_or_else(|error| {
            warn!(
                owner = %self.owner,
                column = %self.column,
                attribute = %spec.name(),
                error = %error,
                "stored attribute does not coerce; using default"
            );
            spec.default_value()
        })
    }
}

impl fmt::Display for SchemaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self
            .describe()
            .into_iter()
            .map(|(name, attribute_type)| format!("{name}:{attribute_type}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "<{} type => {} attribute_set => [{attributes}]>",
            self.type_name, self.owner
        )
    }
}

/// One typed instance of a [`SchemaModel`].
#[derive(Clone)]
pub struct ModelValue {
    model: Arc<SchemaModel>,
    values: Vec<AttributeValue>,
}

impl ModelValue {
    /// Model this value was built from.
    #[must_use]
    pub const fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// Whether this value belongs to `model`.
    #[must_use]
    pub fn is_instance_of(&self, model: &SchemaModel) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.model), model) || self.model.same_shape(model)
    }

    /// Read one attribute.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        let index = self.model.attributes.position(attribute)?;
        self.values.get(index)
    }

    /// Read an attribute by its slot in declaration order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&AttributeValue> {
        self.values.get(index)
    }

    /// Write one attribute, coercing the value into its type.
    pub fn set(
        &mut self,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ModelValueError> {
        let index = self.index_of(attribute)?;
        let spec = self.spec_at(index, attribute)?;
        let coerced = spec
            .attribute_type()
            .coerce(value.into())
            .map_err(|source| ModelValueError::Coercion {
                attribute: attribute.to_owned(),
                source,
            })?;
        self.store(index, coerced);
        Ok(())
    }

    /// Write one attribute from its raw JSON form.
    pub fn set_raw(&mut self, attribute: &str, raw: &Value) -> Result<(), ModelValueError> {
        let index = self.index_of(attribute)?;
        let spec = self.spec_at(index, attribute)?;
        let coerced = spec
            .attribute_type()
            .parse(raw)
            .map_err(|source| ModelValueError::Coercion {
                attribute: attribute.to_owned(),
                source,
            })?;
        self.store(index, coerced);
        Ok(())
    }

    /// Copy of this value with one attribute replaced.
    pub fn with(
        &self,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, ModelValueError> {
        let mut next = self.clone();
        next.set(attribute, value)?;
        Ok(next)
    }

    /// Attribute names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.model
            .attributes
            .iter()
            .map(|spec| spec.name().as_str())
            .zip(self.values.iter())
    }

    /// Convert back to an untyped mapping holding only declared attributes.
    #[must_use]
    pub fn to_untyped(&self) -> Map<String, Value> {
        self.model
            .attributes
            .iter()
            .zip(self.values.iter())
            .map(|(spec, value)| {
                (
                    spec.name().to_string(),
                    spec.attribute_type().serialize(value),
                )
            })
            .collect()
    }

    fn index_of(&self, attribute: &str) -> Result<usize, ModelValueError> {
        self.model
            .attributes
            .position(attribute)
            .ok_or_else(|| ModelValueError::UnknownAttribute {
                model: self.model.type_name.clone(),
                attribute: attribute.to_owned(),
            })
    }

    fn spec_at(&self, index: usize, attribute: &str) -> Result<&AttributeSpec, ModelValueError> {
        self.model
            .attributes
            .iter()
            .nth(index)
            .ok_or_else(|| ModelValueError::UnknownAttribute {
                model: self.model.type_name.clone(),
                attribute: attribute.to_owned(),
            })
    }

    fn store(&mut self, index: usize, value: AttributeValue) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        self.model.same_shape(&other.model) && self.values == other.values
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.model.type_name());
        for (name, value) in self.iter() {
            debug.field(name, value);
        }
        debug.finish()
    }
}

fn dynamic_type_name(column: &str) -> String {
    let mut name: String = column
        .split(|character: char| !character.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut characters = segment.chars();
            characters.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + characters.as_str()
            })
        })
        .collect();
    name.push_str("DynamicType");
    name
}

#[cfg(test)]
mod tests;
