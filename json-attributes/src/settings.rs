//! Declaration settings loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_COLUMN, DeclarationPolicy};

/// Configuration values controlling attribute declarations.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "JSON_ATTRIBUTES")]
pub struct DeclarationSettings {
    /// Column used when a declaration names none.
    pub default_column: Option<String>,
    /// Skip registration while the owner's schema is not provisioned.
    #[ortho_config(default = true)]
    pub skip_unprovisioned: bool,
    /// PostgreSQL connection string used for schema introspection.
    pub database_url: Option<String>,
}

impl DeclarationSettings {
    /// Return the configured default column, falling back to `data`.
    #[must_use]
    pub fn default_column(&self) -> &str {
        self.default_column.as_deref().unwrap_or(DEFAULT_COLUMN)
    }

    /// Declaration policy derived from these settings.
    #[must_use]
    pub fn policy(&self) -> DeclarationPolicy {
        DeclarationPolicy {
            default_column: self.default_column().to_owned(),
            skip_unprovisioned: self.skip_unprovisioned,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for declaration settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> DeclarationSettings {
        DeclarationSettings::load_from_iter([OsString::from("inspect-attributes")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("JSON_ATTRIBUTES_DEFAULT_COLUMN", None::<String>),
            ("JSON_ATTRIBUTES_SKIP_UNPROVISIONED", None::<String>),
            ("JSON_ATTRIBUTES_DATABASE_URL", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.default_column(), "data");
        assert!(settings.skip_unprovisioned);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.policy(), DeclarationPolicy::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("JSON_ATTRIBUTES_DEFAULT_COLUMN", Some("extra_info".to_owned())),
            ("JSON_ATTRIBUTES_SKIP_UNPROVISIONED", Some("false".to_owned())),
            (
                "JSON_ATTRIBUTES_DATABASE_URL",
                Some("postgres://localhost/app".to_owned()),
            ),
        ]);

        let settings = load_from_empty_args();
        let policy = settings.policy();
        assert_eq!(policy.default_column, "extra_info");
        assert!(!policy.skip_unprovisioned);
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/app")
        );
    }
}
