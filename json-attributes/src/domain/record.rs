//! Per-instance access to packed columns and their attributes.
//!
//! An [`AttributeRecord`] snapshots the owner's bindings when it is built and
//! dispatches reads and writes through each binding's accessor table. Writing
//! an attribute never mutates the column value in place: the current value is
//! copied, the slot updated and the column re-assigned, which is what change
//! tracking observes.

use std::sync::Arc;

use serde_json::Value;

use super::ports::{ChangeTracker, DirtyColumns};
use super::{
    AccessorTarget, AttributeValue, BindingRegistry, ColumnBinding, ColumnValue, ModelValue,
    ModelValueError, OwnerTypeId, RawColumnValue, RecordError,
};

#[derive(Debug, Clone)]
struct BoundColumn {
    binding: Arc<ColumnBinding>,
    value: ModelValue,
}

/// Typed view of one record's packed columns.
#[derive(Debug, Clone)]
pub struct AttributeRecord<T = DirtyColumns> {
    owner: OwnerTypeId,
    columns: Vec<BoundColumn>,
    tracker: T,
}

impl AttributeRecord<DirtyColumns> {
    /// New record with every attribute at its default.
    #[must_use]
    pub fn new(registry: &BindingRegistry, owner: &OwnerTypeId) -> Self {
        Self::with_tracker(registry, owner, DirtyColumns::default())
    }
}

impl<T: ChangeTracker> AttributeRecord<T> {
    /// New record reporting column replacements to `tracker`.
    #[must_use]
    pub fn with_tracker(registry: &BindingRegistry, owner: &OwnerTypeId, tracker: T) -> Self {
        let columns = registry
            .bindings(owner)
            .into_iter()
            .map(|binding| {
                let value = binding.model().defaults();
                BoundColumn { binding, value }
            })
            .collect();
        Self {
            owner: owner.clone(),
            columns,
            tracker,
        }
    }

    /// Owning record type.
    #[must_use]
    pub const fn owner(&self) -> &OwnerTypeId {
        &self.owner
    }

    /// Change tracker.
    #[must_use]
    pub const fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Mutable change tracker, e.g. to clear marks after persisting.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// Bound column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|bound| bound.binding.column())
    }

    /// Populate a column from storage without marking it dirty.
    pub fn load_column(&mut self, column: &str, raw: RawColumnValue) -> Result<(), RecordError> {
        let bound = self.bound_mut(column)?;
        bound.value = bound.binding.codec().decode(raw);
        Ok(())
    }

    /// Typed value of a packed column.
    pub fn column(&self, column: &str) -> Result<&ModelValue, RecordError> {
        self.bound(column).map(|bound| &bound.value)
    }

    /// Replace a packed column from user input and mark it dirty.
    ///
    /// Input that cannot be decoded falls back to defaults, as on load.
    pub fn set_column(
        &mut self,
        column: &str,
        value: impl Into<RawColumnValue>,
    ) -> Result<(), RecordError> {
        let raw = value.into();
        let bound = self.bound_mut(column)?;
        bound.value = bound.binding.codec().decode(raw);
        self.tracker.mark_dirty(column);
        Ok(())
    }

    /// Read one attribute.
    pub fn attribute(&self, name: &str) -> Result<&AttributeValue, RecordError> {
        let (index, slot) = self.resolve_attribute(name)?;
        self.columns
            .get(index)
            .and_then(|bound| bound.value.get_index(slot))
            .ok_or_else(|| self.unknown_accessor(name))
    }

    /// Write one attribute, coercing the value into its type.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), RecordError> {
        let value = value.into();
        self.replace_attribute(name, |current| current.set(name, value))
    }

    /// Write one attribute from its raw JSON form.
    pub fn set_attribute_raw(&mut self, name: &str, raw: &Value) -> Result<(), RecordError> {
        self.replace_attribute(name, |current| current.set_raw(name, raw))
    }

    /// Persisted text of a packed column.
    pub fn encode_column(&self, column: &str) -> Result<String, RecordError> {
        let bound = self.bound(column)?;
        let encoded = bound
            .binding
            .codec()
            .encode(&ColumnValue::Typed(bound.value.clone()));
        Ok(encoded
            .as_text()
            .map_or_else(|| Value::Object(bound.value.to_untyped()).to_string(), str::to_owned))
    }

    fn replace_attribute(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut ModelValue) -> Result<(), ModelValueError>,
    ) -> Result<(), RecordError> {
        let (index, _) = self.resolve_attribute(name)?;
        let owner = self.owner.clone();
        let bound = self
            .columns
            .get_mut(index)
            .ok_or_else(|| RecordError::UnknownAccessor {
                owner: owner.clone(),
                accessor: name.to_owned(),
            })?;
        let mut next = bound.value.clone();
        update(&mut next).map_err(|error| match error {
            ModelValueError::UnknownAttribute { attribute, .. } => RecordError::UnknownAccessor {
                owner: owner.clone(),
                accessor: attribute,
            },
            ModelValueError::Coercion { attribute, source } => RecordError::Coercion {
                owner: owner.clone(),
                attribute,
                source,
            },
        })?;
        bound.value = next;
        let column = bound.binding.column().to_owned();
        self.tracker.mark_dirty(&column);
        Ok(())
    }

    fn resolve_attribute(&self, name: &str) -> Result<(usize, usize), RecordError> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(index, bound)| match bound.binding.accessors().lookup(name) {
                Some(AccessorTarget::Attribute { slot }) => Some((index, slot)),
                Some(AccessorTarget::Column) | None => None,
            })
            .ok_or_else(|| self.unknown_accessor(name))
    }

    fn bound(&self, column: &str) -> Result<&BoundColumn, RecordError> {
        self.columns
            .iter()
            .find(|bound| bound.binding.column() == column)
            .ok_or_else(|| RecordError::UnknownColumn {
                owner: self.owner.clone(),
                column: column.to_owned(),
            })
    }

    fn bound_mut(&mut self, column: &str) -> Result<&mut BoundColumn, RecordError> {
        let owner = &self.owner;
        self.columns
            .iter_mut()
            .find(|bound| bound.binding.column() == column)
            .ok_or_else(|| RecordError::UnknownColumn {
                owner: owner.clone(),
                column: column.to_owned(),
            })
    }

    fn unknown_accessor(&self, name: &str) -> RecordError {
        RecordError::UnknownAccessor {
            owner: self.owner.clone(),
            accessor: name.to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
