//! Port through which defaults and validation rules reach the owner.

use crate::domain::{AttributeName, DefaultValue, OwnerTypeId, ValidationRule};

/// Receives per-attribute defaults and validation rules at declaration time.
///
/// Rules are addressed by attribute name, not by the column holding them, so
/// the owner's validation engine reports errors against the virtual attribute.
#[cfg_attr(test, mockall::automock)]
pub trait AttributeHooks: Send + Sync {
    /// Register the default applied to new records.
    fn register_default(&self, owner: &OwnerTypeId, attribute: &AttributeName, default: &DefaultValue);

    /// Register a validation rule evaluated by the owner's validation engine.
    fn register_validation(
        &self,
        owner: &OwnerTypeId,
        attribute: &AttributeName,
        rule: &ValidationRule,
    );
}

/// Hooks implementation that discards every registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAttributeHooks;

impl AttributeHooks for NoopAttributeHooks {
    fn register_default(&self, _owner: &OwnerTypeId, _attribute: &AttributeName, _default: &DefaultValue) {}

    fn register_validation(
        &self,
        _owner: &OwnerTypeId,
        _attribute: &AttributeName,
        _rule: &ValidationRule,
    ) {
    }
}
