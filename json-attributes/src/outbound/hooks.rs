//! Attribute hooks adapter collecting registrations in memory.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::AttributeHooks;
use crate::domain::{AttributeName, DefaultValue, OwnerTypeId, ValidationRule};

/// One registration received through [`AttributeHooks`].
#[derive(Debug, Clone, PartialEq)]
pub enum HookRegistration {
    /// A default for new records.
    Default {
        /// Owner type.
        owner: OwnerTypeId,
        /// Attribute name.
        attribute: AttributeName,
        /// Declared default.
        default: DefaultValue,
    },
    /// A validation rule.
    Validation {
        /// Owner type.
        owner: OwnerTypeId,
        /// Attribute name.
        attribute: AttributeName,
        /// Rule description.
        rule: ValidationRule,
    },
}

impl HookRegistration {
    /// Attribute the registration targets.
    #[must_use]
    pub const fn attribute(&self) -> &AttributeName {
        match self {
            Self::Default { attribute, .. } | Self::Validation { attribute, .. } => attribute,
        }
    }
}

/// Thread-safe collector of hook registrations in arrival order.
#[derive(Debug, Default)]
pub struct RecordingAttributeHooks {
    registrations: Mutex<Vec<HookRegistration>>,
}

impl RecordingAttributeHooks {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every registration so far.
    pub fn registrations(&self) -> Vec<HookRegistration> {
        self.lock().clone()
    }

    /// Registrations for one owner.
    #[must_use]
    pub fn registrations_for(&self, owner: &OwnerTypeId) -> Vec<HookRegistration> {
        self.lock()
            .iter()
            .filter(|registration| match registration {
                HookRegistration::Default { owner: target, .. }
                | HookRegistration::Validation { owner: target, .. } => target == owner,
            })
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HookRegistration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttributeHooks for RecordingAttributeHooks {
    fn register_default(&self, owner: &OwnerTypeId, attribute: &AttributeName, default: &DefaultValue) {
        self.lock().push(HookRegistration::Default {
            owner: owner.clone(),
            attribute: attribute.clone(),
            default: default.clone(),
        });
    }

    fn register_validation(
        &self,
        owner: &OwnerTypeId,
        attribute: &AttributeName,
        rule: &ValidationRule,
    ) {
        self.lock().push(HookRegistration::Validation {
            owner: owner.clone(),
            attribute: attribute.clone(),
            rule: rule.clone(),
        });
    }
}
