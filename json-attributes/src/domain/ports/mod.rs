//! Domain ports describing the owning record type's collaborators.
//!
//! The declaration flow only reaches the storage engine, the validation
//! engine and change tracking through these traits, so adapters map their
//! failures into the typed errors defined here.

mod macros;
pub(crate) use macros::define_port_error;

mod attribute_hooks;
mod change_tracker;
mod record_schema;

#[cfg(test)]
pub use attribute_hooks::MockAttributeHooks;
pub use attribute_hooks::{AttributeHooks, NoopAttributeHooks};
#[cfg(test)]
pub use change_tracker::MockChangeTracker;
pub use change_tracker::{ChangeTracker, DirtyColumns};
#[cfg(test)]
pub use record_schema::MockRecordSchema;
pub use record_schema::{RecordSchema, RecordSchemaError};
