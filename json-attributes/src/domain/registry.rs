//! Process-wide registry of column bindings per owner type.
//!
//! Bindings are published as `Arc<ColumnBinding>` and replaced wholesale on
//! merge, so readers never observe a half-merged attribute set. Parent links
//! are recorded for diagnostics only; a subtype holds its own copies of the
//! parent's bindings.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{AttributeSet, ColumnBinding, DeclarationError, OwnerTypeId, SkipReason};

/// Registration state of one `(owner, column)` pair.
#[derive(Debug, Clone)]
pub enum BindingState {
    /// Nothing was ever declared.
    Unregistered,
    /// A binding is published.
    Active(Arc<ColumnBinding>),
    /// Declaration was skipped because the schema was not provisioned.
    Skipped(SkipReason),
    /// Declaration failed before any binding was published.
    Failed(DeclarationError),
}

impl BindingState {
    /// Whether a binding is published.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Short label for logs and reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Active(_) => "active",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Default)]
struct OwnerEntry {
    parent: Option<OwnerTypeId>,
    columns: Vec<(String, BindingState)>,
}

impl OwnerEntry {
    fn state(&self, column: &str) -> Option<&BindingState> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, state)| state)
    }

    fn set_state(&mut self, column: &str, state: BindingState) {
        match self.columns.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => *slot = state,
            None => self.columns.push((column.to_owned(), state)),
        }
    }

    fn active(&self) -> impl Iterator<Item = &Arc<ColumnBinding>> {
        self.columns.iter().filter_map(|(_, state)| match state {
            BindingState::Active(binding) => Some(binding),
            _ => None,
        })
    }
}

/// Registry of bindings keyed by owner type.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    owners: RwLock<HashMap<OwnerTypeId, OwnerEntry>>,
}

static GLOBAL_REGISTRY: OnceLock<Arc<BindingRegistry>> = OnceLock::new();

impl BindingRegistry {
    /// Empty registry, e.g. one per test.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(Self::new())))
    }

    /// Published binding of `(owner, column)`.
    #[must_use]
    pub fn binding(&self, owner: &OwnerTypeId, column: &str) -> Option<Arc<ColumnBinding>> {
        match self.read().get(owner)?.state(column)? {
            BindingState::Active(binding) => Some(Arc::clone(binding)),
            _ => None,
        }
    }

    /// Published bindings of `owner` in first-declaration order.
    #[must_use]
    pub fn bindings(&self, owner: &OwnerTypeId) -> Vec<Arc<ColumnBinding>> {
        self.read()
            .get(owner)
            .map(|entry| entry.active().map(Arc::clone).collect())
            .unwrap_or_default()
    }

    /// Column name to merged attribute set for every active binding.
    #[must_use]
    pub fn attribute_sets(&self, owner: &OwnerTypeId) -> BTreeMap<String, AttributeSet> {
        self.bindings(owner)
            .into_iter()
            .map(|binding| (binding.column().to_owned(), binding.attributes().clone()))
            .collect()
    }

    /// Registration state of `(owner, column)`.
    #[must_use]
    pub fn state(&self, owner: &OwnerTypeId, column: &str) -> BindingState {
        self.read()
            .get(owner)
            .and_then(|entry| entry.state(column))
            .cloned()
            .unwrap_or(BindingState::Unregistered)
    }

    /// Parent recorded when `owner` inherited its bindings.
    #[must_use]
    pub fn parent_of(&self, owner: &OwnerTypeId) -> Option<OwnerTypeId> {
        self.read().get(owner)?.parent.clone()
    }

    /// Owners with at least one recorded column state, sorted.
    #[must_use]
    pub fn owners(&self) -> Vec<OwnerTypeId> {
        let mut owners: Vec<OwnerTypeId> = self.read().keys().cloned().collect();
        owners.sort();
        owners
    }

    /// Active column of `owner` other than `column` that declares `attribute`.
    #[must_use]
    pub fn column_declaring(
        &self,
        owner: &OwnerTypeId,
        attribute: &str,
        excluding_column: &str,
    ) -> Option<String> {
        self.read().get(owner).and_then(|entry| {
            entry
                .active()
                .find(|binding| {
                    binding.column() != excluding_column
                        && binding.attributes().contains(attribute)
                })
                .map(|binding| binding.column().to_owned())
        })
    }

    pub(crate) fn publish(&self, binding: Arc<ColumnBinding>) {
        let owner = binding.owner().clone();
        let column = binding.column().to_owned();
        self.write()
            .entry(owner)
            .or_default()
            .set_state(&column, BindingState::Active(binding));
    }

    /// Record a skip unless a binding is already active.
    pub(crate) fn record_skipped(&self, owner: &OwnerTypeId, column: &str, reason: SkipReason) {
        self.record_inactive(owner, column, BindingState::Skipped(reason));
    }

    /// Record a failure unless a binding is already active.
    pub(crate) fn record_failed(&self, owner: &OwnerTypeId, column: &str, error: DeclarationError) {
        self.record_inactive(owner, column, BindingState::Failed(error));
    }

    pub(crate) fn set_parent(&self, owner: &OwnerTypeId, parent: &OwnerTypeId) {
        self.write().entry(owner.clone()).or_default().parent = Some(parent.clone());
    }

    fn record_inactive(&self, owner: &OwnerTypeId, column: &str, state: BindingState) {
        let mut owners = self.write();
        let entry = owners.entry(owner.clone()).or_default();
        if entry.state(column).is_some_and(BindingState::is_active) {
            return;
        }
        entry.set_state(column, state);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<OwnerTypeId, OwnerEntry>> {
        self.owners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OwnerTypeId, OwnerEntry>> {
        self.owners.write().unwrap_or_else(PoisonError::into_inner)
    }
}
