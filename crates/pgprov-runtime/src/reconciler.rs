use anyhow::Context;
use pgprov_core::{
    GrantDefinition, GrantedPrivileges, ObjectType, PrivilegeSet, Version, privileges_equal,
    render_grant, render_revoke,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

use crate::catalog::GrantCatalog;

/// Whether a run only reports drift or also corrects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plan,
    Apply,
}

/// Outcome of comparing one definition with the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct GrantPlan {
    pub id: String,
    pub label: String,
    /// Privileges held per object.
    pub granted: BTreeMap<String, GrantedPrivileges>,
    /// Effective desired privileges (`ALL` expanded).
    pub desired: PrivilegeSet,
    pub in_sync: bool,
    /// Statements that bring the role in line. Empty when in sync.
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub server_version: String,
    pub plans: Vec<GrantPlan>,
    /// Number of plans whose statements were executed.
    pub applied: usize,
}

impl RunReport {
    pub fn drifted(&self) -> impl Iterator<Item = &GrantPlan> {
        self.plans.iter().filter(|p| !p.in_sync)
    }
}

pub struct Reconciler<C: GrantCatalog> {
    catalog: C,
    version_override: Option<Version>,
    probed_version: OnceCell<Version>,
}

impl<C: GrantCatalog> Reconciler<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            version_override: None,
            probed_version: OnceCell::new(),
        }
    }

    /// Assume `version` instead of asking the server.
    pub fn with_version(mut self, version: Option<Version>) -> Self {
        self.version_override = version;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Server version used for `ALL` expansion. Probed at most once.
    pub async fn server_version(&self) -> anyhow::Result<Version> {
        if let Some(version) = &self.version_override {
            return Ok(version.clone());
        }
        let version = self
            .probed_version
            .get_or_try_init(|| async {
                let version = self
                    .catalog
                    .server_version()
                    .await
                    .context("failed to determine server version")?;
                tracing::info!(version = %version, "detected server version");
                anyhow::Ok(version)
            })
            .await?;
        Ok(version.clone())
    }

    /// Compare one definition with what the catalog reports.
    pub async fn plan(&self, definition: &GrantDefinition) -> anyhow::Result<GrantPlan> {
        let version = self.server_version().await?;
        let desired = definition.desired()?;
        let object_type = definition.object_type;

        let mut granted = self
            .catalog
            .granted_privileges(definition)
            .await
            .with_context(|| format!("failed to read privileges for {}", definition.label()))?;
        for name in required_names(definition) {
            granted.entry(name).or_default();
        }

        // A bulk grant over a schema without objects of that type has nothing to hold.
        let in_sync = granted.values().all(|held| {
            privileges_equal(&held.privileges, &desired, object_type, &version)
                && held.grant_option_matches(definition.with_grant_option)
        });

        let effective = desired.effective(object_type, &version);
        let statements = if in_sync {
            Vec::new()
        } else {
            let mut statements = vec![render_revoke(definition)];
            if !effective.is_empty() {
                statements.push(render_grant(definition, &effective));
            }
            statements
        };

        if in_sync {
            tracing::debug!(grant = %definition.label(), "grant in sync");
        } else {
            tracing::warn!(
                grant = %definition.label(),
                desired = %effective,
                "grant drifted"
            );
        }

        Ok(GrantPlan {
            id: definition.id(),
            label: definition.label(),
            granted,
            desired: effective,
            in_sync,
            statements,
        })
    }

    /// Plan every definition and, in [`Mode::Apply`], correct the drifted ones.
    ///
    /// All definitions are validated before the catalog is read.
    pub async fn run(
        &self,
        definitions: &[&GrantDefinition],
        mode: Mode,
    ) -> anyhow::Result<RunReport> {
        let version = self.server_version().await?;

        let errors: Vec<String> = definitions
            .iter()
            .flat_map(|d| {
                d.validate(&version)
                    .into_iter()
                    .map(move |e| format!("{}: {e}", d.label()))
            })
            .collect();
        if !errors.is_empty() {
            anyhow::bail!("invalid grant definitions: {}", errors.join("; "));
        }

        let mut plans = Vec::with_capacity(definitions.len());
        let mut applied = 0;

        for definition in definitions {
            let plan = self.plan(definition).await?;

            if mode == Mode::Apply && !plan.in_sync {
                self.catalog
                    .apply(&plan.statements)
                    .await
                    .with_context(|| format!("failed to apply grant {}", plan.label))?;
                tracing::info!(
                    grant = %plan.label,
                    statements = plan.statements.len(),
                    "grant applied"
                );
                applied += 1;
            }

            plans.push(plan);
        }

        Ok(RunReport {
            server_version: version.to_string(),
            plans,
            applied,
        })
    }
}

/// Names the catalog must report on, whether or not they hold privileges.
fn required_names(definition: &GrantDefinition) -> Vec<String> {
    match definition.object_type {
        ObjectType::Database => vec![definition.database.clone()],
        ObjectType::Schema => definition.schema.iter().cloned().collect(),
        ObjectType::Column => definition.columns.clone(),
        _ => definition.objects.clone(),
    }
}
