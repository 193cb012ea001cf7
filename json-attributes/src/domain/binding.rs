//! Registered association between an owner, a packed column and its model.

use std::sync::Arc;

use tracing::debug;

use super::{
    AttributeSet, AttributeSpec, JsonColumnCodec, OwnerTypeId, SchemaModel, StorageKind,
};

/// What an accessor reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorTarget {
    /// The packed column as a whole.
    Column,
    /// One attribute slot of the column's typed value.
    Attribute {
        /// Index in declaration order.
        slot: usize,
    },
}

/// Named accessor exposed to records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    name: String,
    target: AccessorTarget,
}

impl Accessor {
    /// Accessor name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Accessor target.
    #[must_use]
    pub const fn target(&self) -> AccessorTarget {
        self.target
    }
}

/// Dispatch table replacing per-attribute getter and setter methods.
///
/// Holds one [`AccessorTarget::Column`] entry followed by one entry per
/// attribute in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorTable {
    entries: Vec<Accessor>,
}

impl AccessorTable {
    fn build(column: &str, attributes: &AttributeSet) -> Self {
        let column_entry = Accessor {
            name: column.to_owned(),
            target: AccessorTarget::Column,
        };
        let attribute_entries = attributes.iter().enumerate().map(|(slot, spec)| Accessor {
            name: spec.name().to_string(),
            target: AccessorTarget::Attribute { slot },
        });
        Self {
            entries: std::iter::once(column_entry).chain(attribute_entries).collect(),
        }
    }

    /// Resolve an accessor by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<AccessorTarget> {
        self.entries
            .iter()
            .find(|accessor| accessor.name == name)
            .map(Accessor::target)
    }

    /// All accessors, column first.
    pub fn iter(&self) -> std::slice::Iter<'_, Accessor> {
        self.entries.iter()
    }

    /// Number of accessors including the column accessor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty. Never true for a built binding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compiled binding of one owner's packed column.
///
/// Immutable once built; merging produces a new binding.
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    owner: OwnerTypeId,
    column: String,
    storage_kind: StorageKind,
    attributes: AttributeSet,
    model: Arc<SchemaModel>,
    codec: JsonColumnCodec,
    accessors: AccessorTable,
}

impl ColumnBinding {
    /// Compile a binding from a merged attribute set.
    #[must_use]
    pub fn compile(
        owner: OwnerTypeId,
        column: impl Into<String>,
        storage_kind: StorageKind,
        attributes: AttributeSet,
    ) -> Self {
        let column = column.into();
        let model = SchemaModel::compile(&owner, &column, &attributes);
        let codec = JsonColumnCodec::new(Arc::clone(&model));
        let accessors = AccessorTable::build(&column, &attributes);
        Self {
            owner,
            column,
            storage_kind,
            attributes,
            model,
            codec,
            accessors,
        }
    }

    /// New binding with `incoming` merged in; later names win.
    #[must_use]
    pub fn merged(&self, storage_kind: StorageKind, incoming: Vec<AttributeSpec>) -> Self {
        let mut attributes = self.attributes.clone();
        let added = incoming
            .iter()
            .filter(|spec| !attributes.contains(spec.name().as_str()))
            .count();
        let replaced = incoming.len() - added;
        attributes.merge(incoming);
        debug!(
            owner = %self.owner,
            column = %self.column,
            added,
            replaced,
            "merged attribute declarations"
        );
        Self::compile(self.owner.clone(), self.column.clone(), storage_kind, attributes)
    }

    /// Owning record type.
    #[must_use]
    pub const fn owner(&self) -> &OwnerTypeId {
        &self.owner
    }

    /// Packed column name.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_str()
    }

    /// Storage kind of the column.
    #[must_use]
    pub const fn storage_kind(&self) -> &StorageKind {
        &self.storage_kind
    }

    /// Merged attribute specs in declaration order.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Compiled model.
    #[must_use]
    pub const fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// Codec bound to the model.
    #[must_use]
    pub const fn codec(&self) -> &JsonColumnCodec {
        &self.codec
    }

    /// Accessor dispatch table.
    #[must_use]
    pub const fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }
}
