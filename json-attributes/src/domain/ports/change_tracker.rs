//! Change tracking hook invoked when a record's column value is replaced.

use std::collections::BTreeSet;

/// Receives a notification each time a packed column is re-assigned.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeTracker {
    /// Mark `column` as needing persistence.
    fn mark_dirty(&mut self, column: &str);
}

/// Default tracker collecting dirty column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyColumns(BTreeSet<String>);

impl DirtyColumns {
    /// Whether `column` has been marked.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    /// Dirty column names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether nothing is dirty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forget every mark, e.g. after the owner persisted the record.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl ChangeTracker for DirtyColumns {
    fn mark_dirty(&mut self, column: &str) {
        self.0.insert(column.to_owned());
    }
}
