//! The manifest file: connection settings plus declared grants.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{ConfigError, GrantDefinition, ProviderConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default)]
    pub grants: Vec<GrantDefinition>,
}

impl Manifest {
    /// Load a manifest from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a manifest from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Validate every grant against `version`, collecting all problems.
    pub fn validate(&self, version: &Version) -> Result<(), ConfigError> {
        let errors: Vec<String> = self
            .grants
            .iter()
            .enumerate()
            .flat_map(|(idx, grant)| {
                grant
                    .validate(version)
                    .into_iter()
                    .map(move |e| format!("grants[{idx}] ({}): {e}", grant.label()))
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Grants grouped by the database they must be reconciled in.
    pub fn grants_by_database(&self) -> BTreeMap<&str, Vec<&GrantDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&GrantDefinition>> = BTreeMap::new();
        for grant in &self.grants {
            groups.entry(grant.database.as_str()).or_default().push(grant);
        }
        groups
    }
}
