//! Identity of record types that own JSON attribute bindings.

use std::fmt;

use thiserror::Error;

/// Validation errors returned when constructing [`OwnerTypeId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerTypeIdError {
    /// Identifier is empty after trimming whitespace.
    #[error("owner type identifier must not be empty")]
    Empty,
    /// Identifier has leading or trailing whitespace.
    #[error("owner type identifier must not contain surrounding whitespace")]
    ContainsWhitespace,
}

/// Identifier of an owning record type, e.g. `Order` or `Admin::User`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerTypeId(String);

impl OwnerTypeId {
    /// Construct an identifier after checking it is non-empty and trimmed.
    ///
    /// # Examples
    /// ```
    /// use json_attributes::domain::OwnerTypeId;
    ///
    /// let owner = OwnerTypeId::new("Order").expect("valid owner");
    /// assert_eq!(owner.as_str(), "Order");
    /// assert!(OwnerTypeId::new(" Order").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, OwnerTypeIdError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(OwnerTypeIdError::Empty);
        }
        if raw.trim() != raw {
            return Err(OwnerTypeIdError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OwnerTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for OwnerTypeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for OwnerTypeId {
    type Error = OwnerTypeIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
