//! In-memory record schema for fixtures and offline inspection.

use crate::domain::PhysicalColumn;
use crate::domain::ports::{RecordSchema, RecordSchemaError};

/// Record schema backed by a fixed column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRecordSchema {
    table: String,
    columns: Vec<PhysicalColumn>,
    connected: bool,
    table_exists: bool,
}

impl StaticRecordSchema {
    /// Provisioned schema for `table` with `columns`.
    #[must_use]
    pub fn new(table: impl Into<String>, columns: Vec<PhysicalColumn>) -> Self {
        Self {
            table: table.into(),
            columns,
            connected: true,
            table_exists: true,
        }
    }

    /// Schema whose storage is not connected yet.
    #[must_use]
    pub fn disconnected(table: impl Into<String>) -> Self {
        Self {
            connected: false,
            ..Self::new(table, Vec::new())
        }
    }

    /// Connected schema whose table has not been migrated yet.
    #[must_use]
    pub fn without_table(table: impl Into<String>) -> Self {
        Self {
            table_exists: false,
            ..Self::new(table, Vec::new())
        }
    }

    /// Add a column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(PhysicalColumn::new(name, data_type));
        self
    }
}

impl RecordSchema for StaticRecordSchema {
    fn table_name(&self) -> String {
        self.table.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn table_exists(&self, table: &str) -> Result<bool, RecordSchemaError> {
        Ok(self.table_exists && table == self.table)
    }

    fn columns(&self) -> Result<Vec<PhysicalColumn>, RecordSchemaError> {
        Ok(self.columns.clone())
    }
}
