//! Physical columns reported by an owner's schema and their storage kinds.

use std::fmt;

/// Storage kind of a physical column.
///
/// Only [`StorageKind::Json`] and [`StorageKind::Jsonb`] can carry virtual
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// PostgreSQL `json`.
    Json,
    /// PostgreSQL `jsonb`.
    Jsonb,
    /// Any other SQL type, kept verbatim for diagnostics.
    Other(String),
}

impl StorageKind {
    /// Storage kinds that can hold packed attributes.
    pub const SUPPORTED: [&'static str; 2] = ["json", "jsonb"];

    /// Classify an SQL type name such as `jsonb` or `character varying(255)`.
    ///
    /// # Examples
    /// ```
    /// use json_attributes::domain::StorageKind;
    ///
    /// assert_eq!(StorageKind::from_sql_type("JSONB"), StorageKind::Jsonb);
    /// assert!(!StorageKind::from_sql_type("text").is_supported());
    /// ```
    #[must_use]
    pub fn from_sql_type(sql_type: &str) -> Self {
        match sql_type.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "jsonb" => Self::Jsonb,
            _ => Self::Other(sql_type.trim().to_owned()),
        }
    }

    /// Whether attributes may be packed into this kind.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Json | Self::Jsonb)
    }

    /// SQL spelling of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Other(sql_type) => sql_type.as_str(),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column reported by the owner's physical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalColumn {
    /// Column name.
    pub name: String,
    /// SQL type as reported by the database.
    pub data_type: String,
}

impl PhysicalColumn {
    /// Construct a column description.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Storage kind derived from the SQL type.
    #[must_use]
    pub fn storage_kind(&self) -> StorageKind {
        StorageKind::from_sql_type(&self.data_type)
    }
}
