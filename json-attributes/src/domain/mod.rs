//! Domain model for typed json attributes.
//!
//! Purpose: describe virtual attributes packed into a single `json`/`jsonb`
//! column, compile them into a typed model, and publish the resulting column
//! bindings per owner type. The domain reaches the storage engine, the
//! validation engine and change tracking only through [`ports`].
//!
//! Public surface:
//! - [`AttributeType`] and [`AttributeValue`]: the type registry and its values.
//! - [`AttributeSpec`], [`AttributeSet`], [`AttributeDeclarations`]: validated
//!   declarations.
//! - [`SchemaModel`], [`ModelValue`], [`JsonColumnCodec`]: typed values and
//!   their persisted form.
//! - [`AttributeDeclarer`], [`BindingRegistry`], [`ColumnBinding`]: registration.
//! - [`AttributeRecord`]: per-instance accessors.

pub mod ports;

mod attribute_spec;
mod attribute_type;
mod attribute_value;
mod binding;
mod codec;
mod column;
mod declaration;
mod error;
mod owner;
mod record;
mod registry;
mod schema_model;

pub use self::attribute_spec::{
    ALLOWED_OPTION_KEYS, AttributeDeclarations, AttributeName, AttributeOptions, AttributeSet,
    AttributeSpec, DefaultGenerator, DefaultValue, SpecError, ValidationRule,
};
pub use self::attribute_type::{AttributeType, CoercionError, UnknownTypeError, to_json};
pub use self::attribute_value::AttributeValue;
pub use self::binding::{Accessor, AccessorTable, AccessorTarget, ColumnBinding};
pub use self::codec::{
    ColumnValue, DecodeFallback, Decoded, EncodedColumn, JsonColumnCodec, RawColumnValue,
};
pub use self::column::{PhysicalColumn, StorageKind};
pub use self::declaration::{
    AttributeDeclarer, DEFAULT_COLUMN, DeclarationPolicy, InheritedColumn, OwnerContext,
    RegistrationOutcome,
};
pub use self::error::{DeclarationError, RecordError, SkipReason};
pub use self::owner::{OwnerTypeId, OwnerTypeIdError};
pub use self::record::AttributeRecord;
pub use self::registry::{BindingRegistry, BindingState};
pub use self::schema_model::{ModelValue, ModelValueError, SchemaModel};
