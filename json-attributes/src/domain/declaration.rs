//! Declaration entry points for json attributes.
//!
//! A declaration checks that the owner's schema is provisioned, validates the
//! column and every attribute, merges the result into the existing binding and
//! publishes it. Any error aborts before publication, so a failed declaration
//! never leaves a partial binding behind.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{AttributeHooks, RecordSchema, RecordSchemaError};
use crate::domain::{
    AttributeDeclarations, AttributeSpec, BindingRegistry, ColumnBinding, DeclarationError,
    OwnerTypeId, PhysicalColumn, SkipReason, StorageKind,
};

/// Column used when a declaration names none.
pub const DEFAULT_COLUMN: &str = "data";

/// Behaviour switches for declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationPolicy {
    /// Column targeted by [`AttributeDeclarer::declare_default_column`].
    pub default_column: String,
    /// Skip instead of fail when the owner's schema is not provisioned.
    pub skip_unprovisioned: bool,
}

impl Default for DeclarationPolicy {
    fn default() -> Self {
        Self {
            default_column: DEFAULT_COLUMN.to_owned(),
            skip_unprovisioned: true,
        }
    }
}

/// Collaborators of one owning record type.
#[derive(Clone)]
pub struct OwnerContext {
    id: OwnerTypeId,
    schema: Arc<dyn RecordSchema>,
    hooks: Arc<dyn AttributeHooks>,
}

impl OwnerContext {
    /// Bundle an owner with its schema and hook ports.
    #[must_use]
    pub const fn new(
        id: OwnerTypeId,
        schema: Arc<dyn RecordSchema>,
        hooks: Arc<dyn AttributeHooks>,
    ) -> Self {
        Self { id, schema, hooks }
    }

    /// Owner identifier.
    #[must_use]
    pub const fn id(&self) -> &OwnerTypeId {
        &self.id
    }

    /// Physical schema port.
    #[must_use]
    pub fn schema(&self) -> &dyn RecordSchema {
        self.schema.as_ref()
    }

    /// Default and validation hooks.
    #[must_use]
    pub fn hooks(&self) -> &dyn AttributeHooks {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for OwnerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Successful outcome of a declaration.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    /// The binding was created or merged and published.
    Registered(Arc<ColumnBinding>),
    /// The schema was not provisioned; nothing changed.
    Skipped(SkipReason),
}

impl RegistrationOutcome {
    /// Published binding, if registered.
    #[must_use]
    pub fn binding(&self) -> Option<&Arc<ColumnBinding>> {
        match self {
            Self::Registered(binding) => Some(binding),
            Self::Skipped(_) => None,
        }
    }

    /// Skip reason, if skipped.
    #[must_use]
    pub const fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Registered(_) => None,
            Self::Skipped(reason) => Some(reason),
        }
    }
}

/// Result of re-declaring one parent column on a subtype.
#[derive(Debug, Clone)]
pub struct InheritedColumn {
    /// Parent column being copied.
    pub column: String,
    /// Outcome of the re-declaration on the child.
    pub result: Result<RegistrationOutcome, DeclarationError>,
}

/// Declares json attributes on owners and publishes their bindings.
#[derive(Debug, Clone)]
pub struct AttributeDeclarer {
    registry: Arc<BindingRegistry>,
    policy: DeclarationPolicy,
}

impl AttributeDeclarer {
    /// Declarer publishing into `registry`.
    #[must_use]
    pub const fn new(registry: Arc<BindingRegistry>, policy: DeclarationPolicy) -> Self {
        Self { registry, policy }
    }

    /// Declarer publishing into [`BindingRegistry::global`].
    #[must_use]
    pub fn global(policy: DeclarationPolicy) -> Self {
        Self::new(BindingRegistry::global(), policy)
    }

    /// Registry bindings are published to.
    #[must_use]
    pub const fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> &DeclarationPolicy {
        &self.policy
    }

    /// Declare attributes on the policy's default column.
    pub fn declare_default_column(
        &self,
        owner: &OwnerContext,
        declarations: &AttributeDeclarations,
    ) -> Result<RegistrationOutcome, DeclarationError> {
        self.declare_json_attributes(owner, &self.policy.default_column, declarations)
    }

    /// Declare attributes packed into `column` of `owner`.
    ///
    /// Re-declaring an attribute replaces its earlier spec in place. The
    /// registry records skips and failures for diagnostics; an already
    /// active binding is never replaced by either.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use json_attributes::domain::ports::NoopAttributeHooks;
    /// use json_attributes::domain::{
    ///     AttributeDeclarations, AttributeDeclarer, BindingRegistry, DeclarationPolicy,
    ///     OwnerContext, OwnerTypeId, PhysicalColumn,
    /// };
    /// use json_attributes::outbound::schema::StaticRecordSchema;
    /// use serde_json::json;
    ///
    /// let schema = StaticRecordSchema::new(
    ///     "orders",
    ///     vec![PhysicalColumn::new("id", "bigint"), PhysicalColumn::new("data", "jsonb")],
    /// );
    /// let owner = OwnerContext::new(
    ///     OwnerTypeId::new("Order").expect("valid owner"),
    ///     Arc::new(schema),
    ///     Arc::new(NoopAttributeHooks),
    /// );
    /// let declarer = AttributeDeclarer::new(
    ///     Arc::new(BindingRegistry::new()),
    ///     DeclarationPolicy::default(),
    /// );
    /// let declarations = AttributeDeclarations::from_json(&json!({"name": {}}))
    ///     .expect("valid declarations");
    ///
    /// let outcome = declarer
    ///     .declare_json_attributes(&owner, "data", &declarations)
    ///     .expect("declaration succeeds");
    /// assert!(outcome.binding().is_some());
    /// ```
    pub fn declare_json_attributes(
        &self,
        owner: &OwnerContext,
        column: &str,
        declarations: &AttributeDeclarations,
    ) -> Result<RegistrationOutcome, DeclarationError> {
        let result = self.try_declare(owner, column, declarations);
        match &result {
            Ok(RegistrationOutcome::Registered(_)) => {}
            Ok(RegistrationOutcome::Skipped(reason)) => {
                self.registry.record_skipped(owner.id(), column, reason.clone());
            }
            Err(error) => {
                warn!(
                    owner = %owner.id(),
                    column,
                    kind = error.kind(),
                    error = %error,
                    "json attribute declaration failed"
                );
                self.registry.record_failed(owner.id(), column, error.clone());
            }
        }
        result
    }

    /// Copy every active binding of `parent` onto `child`.
    ///
    /// Each binding is re-declared on the child from a snapshot of the
    /// parent's specs, so later declarations on either side stay independent.
    /// Every parent column yields one result; a failing column does not stop
    /// the others. A parent without bindings yields no results.
    #[must_use]
    pub fn inherit(&self, parent: &OwnerTypeId, child: &OwnerContext) -> Vec<InheritedColumn> {
        self.registry.set_parent(child.id(), parent);
        let bindings = self.registry.bindings(parent);
        debug!(
            parent = %parent,
            child = %child.id(),
            columns = bindings.len(),
            "inheriting json attribute bindings"
        );
        bindings
            .iter()
            .map(|binding| {
                let declarations = AttributeDeclarations::from_specs(binding.attributes());
                InheritedColumn {
                    column: binding.column().to_owned(),
                    result: self.declare_json_attributes(child, binding.column(), &declarations),
                }
            })
            .collect()
    }

    fn try_declare(
        &self,
        owner: &OwnerContext,
        column: &str,
        declarations: &AttributeDeclarations,
    ) -> Result<RegistrationOutcome, DeclarationError> {
        let columns = match introspect(owner)? {
            Introspection::Columns(columns) => columns,
            Introspection::Unprovisioned(reason) => return self.unprovisioned(owner, column, reason),
        };
        let storage_kind = resolve_column(owner, column, &columns)?;
        let specs = declarations
            .validate()
            .map_err(|source| DeclarationError::Spec {
                owner: owner.id().clone(),
                source,
            })?;
        self.check_collisions(owner, column, &columns, &specs)?;

        let binding = Arc::new(match self.registry.binding(owner.id(), column) {
            Some(existing) => existing.merged(storage_kind, specs.clone()),
            None => ColumnBinding::compile(
                owner.id().clone(),
                column,
                storage_kind,
                specs.iter().cloned().collect(),
            ),
        });
        self.registry.publish(Arc::clone(&binding));
        register_hooks(owner, &specs);

        info!(
            owner = %owner.id(),
            column,
            storage_kind = %binding.storage_kind(),
            attributes = binding.attributes().len(),
            model = binding.model().type_name(),
            "registered json attributes"
        );
        Ok(RegistrationOutcome::Registered(binding))
    }

    fn unprovisioned(
        &self,
        owner: &OwnerContext,
        column: &str,
        reason: SkipReason,
    ) -> Result<RegistrationOutcome, DeclarationError> {
        if !self.policy.skip_unprovisioned {
            return Err(DeclarationError::SchemaUnavailable {
                owner: owner.id().clone(),
                reason,
            });
        }
        warn!(
            owner = %owner.id(),
            column,
            reason = %reason,
            "schema not provisioned; skipping json attribute registration"
        );
        Ok(RegistrationOutcome::Skipped(reason))
    }

    fn check_collisions(
        &self,
        owner: &OwnerContext,
        column: &str,
        columns: &[PhysicalColumn],
        specs: &[AttributeSpec],
    ) -> Result<(), DeclarationError> {
        for spec in specs {
            let attribute = spec.name().as_str();
            if columns.iter().any(|physical| physical.name == attribute) {
                return Err(DeclarationError::AttributeShadowsColumn {
                    owner: owner.id().clone(),
                    attribute: attribute.to_owned(),
                });
            }
            if let Some(bound_column) = self.registry.column_declaring(owner.id(), attribute, column)
            {
                return Err(DeclarationError::AttributeBoundElsewhere {
                    owner: owner.id().clone(),
                    attribute: attribute.to_owned(),
                    bound_column,
                });
            }
        }
        Ok(())
    }
}

enum Introspection {
    Columns(Vec<PhysicalColumn>),
    Unprovisioned(SkipReason),
}

fn introspect(owner: &OwnerContext) -> Result<Introspection, DeclarationError> {
    let schema = owner.schema();
    if !schema.is_connected() {
        return Ok(Introspection::Unprovisioned(SkipReason::NotConnected));
    }
    let table = schema.table_name();
    match schema.table_exists(&table) {
        Ok(true) => {}
        Ok(false) => return Ok(Introspection::Unprovisioned(SkipReason::TableMissing { table })),
        Err(error) => return port_failure(owner, error),
    }
    match schema.columns() {
        Ok(columns) => Ok(Introspection::Columns(columns)),
        Err(error) => port_failure(owner, error),
    }
}

fn port_failure(
    owner: &OwnerContext,
    error: RecordSchemaError,
) -> Result<Introspection, DeclarationError> {
    match error {
        RecordSchemaError::Connection { message } => Ok(Introspection::Unprovisioned(
            SkipReason::ConnectionFailed { message },
        )),
        source @ RecordSchemaError::Query { .. } => Err(DeclarationError::Introspection {
            owner: owner.id().clone(),
            source,
        }),
    }
}

fn resolve_column(
    owner: &OwnerContext,
    column: &str,
    columns: &[PhysicalColumn],
) -> Result<StorageKind, DeclarationError> {
    let physical = columns
        .iter()
        .find(|physical| physical.name == column)
        .ok_or_else(|| DeclarationError::UnknownColumn {
            owner: owner.id().clone(),
            table: owner.schema().table_name(),
            column: column.to_owned(),
        })?;
    let storage_kind = physical.storage_kind();
    if !storage_kind.is_supported() {
        return Err(DeclarationError::UnsupportedColumnType {
            owner: owner.id().clone(),
            column: column.to_owned(),
            sql_type: physical.data_type.clone(),
        });
    }
    Ok(storage_kind)
}

fn register_hooks(owner: &OwnerContext, specs: &[AttributeSpec]) {
    let hooks = owner.hooks();
    for spec in specs {
        if let Some(default) = spec.declared_default() {
            hooks.register_default(owner.id(), spec.name(), default);
        }
        if let Some(rule) = spec.validation() {
            hooks.register_validation(owner.id(), spec.name(), rule);
        }
    }
}

#[cfg(test)]
#[path = "declaration_tests.rs"]
mod tests;
