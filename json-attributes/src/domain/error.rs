//! Errors surfaced by declarations and record accessors.

use std::fmt;

use thiserror::Error;

use super::ports::RecordSchemaError;
use super::{CoercionError, OwnerTypeId, SpecError};

/// Declaration-time failures. Nothing is registered when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The column does not exist on the owner's table.
    #[error("{owner}: column `{column}` does not exist in table `{table}`")]
    UnknownColumn {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Owner table.
        table: String,
        /// Requested column.
        column: String,
    },
    /// The column exists but is not `json` or `jsonb`.
    #[error("{owner}: column `{column}` has SQL type `{sql_type}`, supported types are: json, jsonb")]
    UnsupportedColumnType {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Requested column.
        column: String,
        /// SQL type reported by the schema.
        sql_type: String,
    },
    /// An attribute declaration is malformed.
    #[error("{owner}: {source}")]
    Spec {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Validation failure.
        #[source]
        source: SpecError,
    },
    /// An attribute name equals a physical column of the owner.
    #[error("{owner}: attribute `{attribute}` is already defined as a table column")]
    AttributeShadowsColumn {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Colliding attribute.
        attribute: String,
    },
    /// An attribute name is already bound to another packed column.
    #[error("{owner}: attribute `{attribute}` is already bound to column `{bound_column}`")]
    AttributeBoundElsewhere {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Colliding attribute.
        attribute: String,
        /// Column already holding it.
        bound_column: String,
    },
    /// The owner's schema is not provisioned and skipping is disabled.
    #[error("{owner}: schema unavailable: {reason}")]
    SchemaUnavailable {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Why the schema could not be used.
        reason: SkipReason,
    },
    /// Introspection failed after the schema was reported as provisioned.
    #[error("{owner}: schema introspection failed: {source}")]
    Introspection {
        /// Declaring owner.
        owner: OwnerTypeId,
        /// Port failure.
        #[source]
        source: RecordSchemaError,
    },
}

impl DeclarationError {
    /// Snake-case label of the failure; malformed declarations report their own kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownColumn { .. } => "unknown_column",
            Self::UnsupportedColumnType { .. } => "unsupported_column_type",
            Self::Spec { source, .. } => source.kind(),
            Self::AttributeShadowsColumn { .. } => "attribute_shadows_column",
            Self::AttributeBoundElsewhere { .. } => "attribute_bound_elsewhere",
            Self::SchemaUnavailable { .. } => "schema_unavailable",
            Self::Introspection { .. } => "introspection",
        }
    }

    /// Owner the failed declaration targeted.
    #[must_use]
    pub const fn owner(&self) -> &OwnerTypeId {
        match self {
            Self::UnknownColumn { owner, .. }
            | Self::UnsupportedColumnType { owner, .. }
            | Self::Spec { owner, .. }
            | Self::AttributeShadowsColumn { owner, .. }
            | Self::AttributeBoundElsewhere { owner, .. }
            | Self::SchemaUnavailable { owner, .. }
            | Self::Introspection { owner, .. } => owner,
        }
    }
}

/// Why a declaration was skipped instead of registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The storage backend is not connected or not migrated.
    NotConnected,
    /// The owner's table does not exist yet.
    TableMissing {
        /// Missing table.
        table: String,
    },
    /// The backend refused the connection while checking provisioning.
    ConnectionFailed {
        /// Port message.
        message: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("storage is not connected"),
            Self::TableMissing { table } => write!(f, "table `{table}` does not exist"),
            Self::ConnectionFailed { message } => write!(f, "connection failed: {message}"),
        }
    }
}

/// Misuse of record accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// No accessor with this name is bound for the owner.
    #[error("{owner} has no accessor `{accessor}`")]
    UnknownAccessor {
        /// Record owner.
        owner: OwnerTypeId,
        /// Requested accessor.
        accessor: String,
    },
    /// No packed column with this name is bound for the owner.
    #[error("{owner} has no json attribute column `{column}`")]
    UnknownColumn {
        /// Record owner.
        owner: OwnerTypeId,
        /// Requested column.
        column: String,
    },
    /// The value does not coerce into the attribute's type.
    #[error("{owner}.{attribute}: {source}")]
    Coercion {
        /// Record owner.
        owner: OwnerTypeId,
        /// Attribute being written.
        attribute: String,
        /// Coercion failure.
        #[source]
        source: CoercionError,
    },
}
