//! Offline inspection of attribute declaration documents.
//!
//! A document names an owner, its table and the attributes packed into each
//! json column:
//!
//! ```json
//! {
//!   "owner": "Order",
//!   "table": "orders",
//!   "columns": {"id": "bigint", "data": "jsonb"},
//!   "attributes": {"data": {"name": {"type": "String"}}}
//! }
//! ```
//!
//! A file holds one document or an array of them. Documents are declared in
//! file order, so a `parent` must appear before its subtypes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::domain::ports::{AttributeHooks, RecordSchema};
use crate::domain::{
    AttributeDeclarations, AttributeDeclarer, DeclarationError, DefaultValue, OwnerContext,
    OwnerTypeId, OwnerTypeIdError, PhysicalColumn, RegistrationOutcome, SkipReason, SpecError,
};
use crate::outbound::hooks::{HookRegistration, RecordingAttributeHooks};
use crate::outbound::schema::{PostgresRecordSchema, StaticRecordSchema};

/// Errors that stop an inspection before any declaration runs.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The declarations file could not be read.
    #[error("read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The declarations file is not a valid document.
    #[error("parse declarations: {0}")]
    Parse(#[from] serde_json::Error),
    /// A document names an invalid owner.
    #[error("invalid owner: {0}")]
    Owner(#[from] OwnerTypeIdError),
    /// A column entry does not map to an SQL type name.
    #[error("{owner}: column `{column}` must map to an SQL type name")]
    ColumnType {
        /// Document owner.
        owner: String,
        /// Offending column.
        column: String,
    },
    /// Attribute declarations for a column are malformed.
    #[error("{owner}.{column}: {source}")]
    Declarations {
        /// Document owner.
        owner: String,
        /// Column being declared.
        column: String,
        /// Parse failure.
        #[source]
        source: SpecError,
    },
}

/// One owner's declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarationDocument {
    /// Owner type name.
    pub owner: String,
    /// Table backing the owner.
    pub table: String,
    /// Owner whose bindings are inherited first.
    #[serde(default)]
    pub parent: Option<String>,
    /// Column name to SQL type, used when no database is configured.
    #[serde(default)]
    pub columns: Option<Map<String, Value>>,
    /// Column name to attribute declarations.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclarationFile {
    Many(Vec<DeclarationDocument>),
    One(DeclarationDocument),
}

/// Load documents from a JSON file holding one document or an array.
pub fn load_documents(path: &Path) -> Result<Vec<DeclarationDocument>, InspectError> {
    let raw = fs::read_to_string(path).map_err(|source| InspectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_documents(&raw)
}

/// Parse documents from JSON text.
pub fn parse_documents(raw: &str) -> Result<Vec<DeclarationDocument>, InspectError> {
    Ok(match serde_json::from_str::<DeclarationFile>(raw)? {
        DeclarationFile::Many(documents) => documents,
        DeclarationFile::One(document) => vec![document],
    })
}

/// Outcome of one declaration in a report.
#[derive(Debug, Clone)]
pub enum ReportEntry {
    /// Binding published.
    Registered {
        /// Owner type.
        owner: OwnerTypeId,
        /// Column name.
        column: String,
        /// Storage kind.
        storage_kind: String,
        /// Rendered model description.
        model: String,
    },
    /// Declaration skipped because the schema was not provisioned.
    Skipped {
        /// Owner type.
        owner: OwnerTypeId,
        /// Column name.
        column: String,
        /// Skip reason.
        reason: SkipReason,
    },
    /// Declaration rejected.
    Failed {
        /// Owner type.
        owner: OwnerTypeId,
        /// Column name.
        column: String,
        /// Failure.
        error: DeclarationError,
    },
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered {
                owner,
                column,
                storage_kind,
                model,
            } => write!(f, "registered {owner}.{column} ({storage_kind}) {model}"),
            Self::Skipped {
                owner,
                column,
                reason,
            } => write!(f, "skipped {owner}.{column}: {reason}"),
            Self::Failed {
                owner,
                column,
                error,
            } => write!(f, "failed {owner}.{column}: {error}"),
        }
    }
}

/// Result of inspecting a set of documents.
#[derive(Debug, Clone, Default)]
pub struct InspectionReport {
    /// One entry per declaration, in declaration order.
    pub entries: Vec<ReportEntry>,
    /// Defaults and validation rules received by the hooks.
    pub hooks: Vec<HookRegistration>,
}

impl InspectionReport {
    /// Whether any declaration failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, ReportEntry::Failed { .. }))
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        for registration in &self.hooks {
            match registration {
                HookRegistration::Default {
                    owner,
                    attribute,
                    default,
                } => match default {
                    DefaultValue::Value(value) => {
                        writeln!(f, "  default {owner}.{attribute} = {value}")?;
                    }
                    DefaultValue::Generator(_) => {
                        writeln!(f, "  default {owner}.{attribute} = <generated>")?;
                    }
                },
                HookRegistration::Validation {
                    owner,
                    attribute,
                    rule,
                } => writeln!(f, "  validates {owner}.{attribute} {}", rule.as_value())?,
            }
        }
        Ok(())
    }
}

/// Runs declaration documents against a declarer.
#[derive(Debug)]
pub struct Inspector {
    declarer: AttributeDeclarer,
    database_url: Option<String>,
    hooks: Arc<RecordingAttributeHooks>,
}

impl Inspector {
    /// Inspector introspecting Postgres when `database_url` is set and
    /// otherwise using each document's `columns`.
    #[must_use]
    pub fn new(declarer: AttributeDeclarer, database_url: Option<String>) -> Self {
        Self {
            declarer,
            database_url,
            hooks: Arc::new(RecordingAttributeHooks::new()),
        }
    }

    /// Declare every document in order and collect the outcomes.
    pub fn run(&self, documents: &[DeclarationDocument]) -> Result<InspectionReport, InspectError> {
        let mut entries = Vec::new();
        for document in documents {
            entries.extend(self.inspect_document(document)?);
        }
        info!(
            documents = documents.len(),
            entries = entries.len(),
            "inspected json attribute declarations"
        );
        Ok(InspectionReport {
            entries,
            hooks: self.hooks.registrations(),
        })
    }

    fn inspect_document(
        &self,
        document: &DeclarationDocument,
    ) -> Result<Vec<ReportEntry>, InspectError> {
        let owner = OwnerTypeId::new(document.owner.as_str())?;
        let context = OwnerContext::new(
            owner.clone(),
            self.schema_for(document)?,
            Arc::clone(&self.hooks) as Arc<dyn AttributeHooks>,
        );
        let mut entries = Vec::new();

        if let Some(parent) = &document.parent {
            let parent = OwnerTypeId::new(parent.as_str())?;
            entries.extend(
                self.declarer
                    .inherit(&parent, &context)
                    .into_iter()
                    .map(|inherited| column_entry(&owner, inherited.column, inherited.result)),
            );
        }

        for (column, raw) in &document.attributes {
            let declarations =
                AttributeDeclarations::from_json(raw).map_err(|source| InspectError::Declarations {
                    owner: document.owner.clone(),
                    column: column.clone(),
                    source,
                })?;
            let result = self
                .declarer
                .declare_json_attributes(&context, column, &declarations);
            entries.push(column_entry(&owner, column.clone(), result));
        }
        Ok(entries)
    }

    fn schema_for(
        &self,
        document: &DeclarationDocument,
    ) -> Result<Arc<dyn RecordSchema>, InspectError> {
        if let Some(url) = &self.database_url {
            return Ok(Arc::new(PostgresRecordSchema::new(
                url.as_str(),
                document.table.as_str(),
            )));
        }
        let Some(columns) = &document.columns else {
            return Ok(Arc::new(StaticRecordSchema::disconnected(
                document.table.as_str(),
            )));
        };
        let columns = columns
            .iter()
            .map(|(name, data_type)| {
                data_type
                    .as_str()
                    .map(|data_type| PhysicalColumn::new(name.as_str(), data_type))
                    .ok_or_else(|| InspectError::ColumnType {
                        owner: document.owner.clone(),
                        column: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(StaticRecordSchema::new(
            document.table.as_str(),
            columns,
        )))
    }
}

fn column_entry(
    owner: &OwnerTypeId,
    column: String,
    result: Result<RegistrationOutcome, DeclarationError>,
) -> ReportEntry {
    match result {
        Ok(RegistrationOutcome::Registered(binding)) => ReportEntry::Registered {
            owner: binding.owner().clone(),
            column: binding.column().to_owned(),
            storage_kind: binding.storage_kind().to_string(),
            model: binding.model().to_string(),
        },
        Ok(RegistrationOutcome::Skipped(reason)) => ReportEntry::Skipped {
            owner: owner.clone(),
            column,
            reason,
        },
        Err(error) => ReportEntry::Failed {
            owner: owner.clone(),
            column,
            error,
        },
    }
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
