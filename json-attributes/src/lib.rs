//! Typed virtual attributes packed into a single `json`/`jsonb` column.
//!
//! Owners declare named, typed attributes per column; declarations compile
//! into a [`domain::SchemaModel`] and a codec that decode stored text into
//! typed values and encode them back. See [`domain::AttributeDeclarer`] for
//! the entry point.

pub mod domain;
pub mod inspect;
pub mod outbound;
pub mod settings;

pub use domain::{AttributeDeclarer, AttributeRecord, BindingRegistry};
pub use settings::DeclarationSettings;
