//! Port abstraction for introspecting an owner's physical table.

use crate::domain::PhysicalColumn;

use super::define_port_error;

define_port_error! {
    /// Errors raised while introspecting an owner's physical schema.
    pub enum RecordSchemaError {
        /// Connection to the backing datastore failed.
        Connection { message: String } =>
            "record schema connection failed: {message}",
        /// Introspection query failed.
        Query { message: String } =>
            "record schema query failed: {message}",
    }
}

/// Port for reading the physical schema of an owning record type.
///
/// Implementations must answer `is_connected` without failing; the declaration
/// flow uses it to decide whether column introspection can be trusted yet.
#[cfg_attr(test, mockall::automock)]
pub trait RecordSchema: Send + Sync {
    /// Name of the table backing the owner.
    fn table_name(&self) -> String;

    /// Whether the backing store is reachable and migrated.
    fn is_connected(&self) -> bool;

    /// Whether `table` exists in the backing store.
    fn table_exists(&self, table: &str) -> Result<bool, RecordSchemaError>;

    /// Columns of the owner's table, in table order.
    fn columns(&self) -> Result<Vec<PhysicalColumn>, RecordSchemaError>;
}
