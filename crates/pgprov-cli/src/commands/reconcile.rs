//! `pgprov plan` and `pgprov apply`.
//!
//! Grants are reconciled per database: one catalog connection is opened for
//! each database named in the manifest. The whole manifest is validated
//! before anything is applied.

use anyhow::{Context, Result};
use clap::ValueEnum;
use pgprov_adapter_pg::PostgresCatalog;
use pgprov_core::{GrantDefinition, Manifest, Version};
use pgprov_runtime::{GrantCatalog, Mode, Reconciler, RunReport};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub async fn run(manifest: &Manifest, mode: Mode, format: Format) -> Result<()> {
    if manifest.grants.is_empty() {
        println!("No grants declared.");
        return Ok(());
    }

    let groups = manifest.grants_by_database();

    let mut catalogs = Vec::with_capacity(groups.len());
    for database in groups.keys() {
        catalogs.push(PostgresCatalog::connect(&manifest.provider, database).await?);
    }

    // Every database lives on the same server, so one probe answers for all.
    let version = match (manifest.provider.expected_version()?, catalogs.first()) {
        (Some(version), _) => version,
        (None, Some(catalog)) => catalog
            .server_version()
            .await
            .context("failed to determine server version")?,
        (None, None) => return Ok(()),
    };
    tracing::info!(version = %version, "target server version");
    manifest
        .validate(&version)
        .context("manifest is not valid for this server")?;

    let runs = catalogs
        .into_iter()
        .zip(groups)
        .map(|(catalog, (database, grants))| (database, catalog, grants));
    let outcome = reconcile_databases(runs, &version, mode).await;

    let reports = match &outcome {
        Ok(reports) => reports,
        Err(stopped) => &stopped.reports,
    };
    if outcome.is_ok() || !reports.is_empty() {
        match format {
            Format::Text => print!("{}", render_text(reports, mode)),
            Format::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        }
    }

    outcome.map(|_| ()).map_err(|stopped| stopped.error)
}

/// A run that failed part way, with the reports of the databases finished before.
#[derive(Debug)]
pub struct Stopped {
    pub reports: BTreeMap<String, RunReport>,
    pub error: anyhow::Error,
}

/// Reconcile each database in turn, stopping at the first failure.
pub async fn reconcile_databases<'a, C, I>(
    runs: I,
    version: &Version,
    mode: Mode,
) -> Result<BTreeMap<String, RunReport>, Stopped>
where
    C: GrantCatalog,
    I: IntoIterator<Item = (&'a str, C, Vec<&'a GrantDefinition>)>,
{
    let mut reports = BTreeMap::new();
    for (database, catalog, grants) in runs {
        tracing::info!(database = %database, grants = grants.len(), "reconciling");
        let result = Reconciler::new(catalog)
            .with_version(Some(version.clone()))
            .run(&grants, mode)
            .await;

        match result {
            Ok(report) => {
                reports.insert(database.to_string(), report);
            }
            Err(e) => {
                if mode == Mode::Apply && !reports.is_empty() {
                    tracing::warn!(
                        done = reports.len(),
                        "stopped after applying to some databases"
                    );
                }
                return Err(Stopped {
                    reports,
                    error: e.context(format!("failed to reconcile database '{database}'")),
                });
            }
        }
    }
    Ok(reports)
}

/// Text report, one block per database.
pub fn render_text(reports: &BTreeMap<String, RunReport>, mode: Mode) -> String {
    let mut out = String::new();
    let mut drifted = 0;
    let mut applied = 0;

    for (database, report) in reports {
        out.push_str(&format!(
            "database {} (PostgreSQL {})\n",
            database, report.server_version
        ));
        for plan in &report.plans {
            if plan.in_sync {
                out.push_str(&format!("  ✔ {}\n", plan.label));
                continue;
            }
            drifted += 1;
            out.push_str(&format!("  ✘ {} (desired {})\n", plan.label, plan.desired));
            for (object, held) in &plan.granted {
                out.push_str(&format!("      {object}: {held}\n"));
            }
            for statement in &plan.statements {
                out.push_str(&format!("    {statement};\n"));
            }
        }
        applied += report.applied;
    }

    match mode {
        Mode::Plan => out.push_str(&format!("\n{drifted} grant(s) to change.\n")),
        Mode::Apply => out.push_str(&format!("\n{applied} grant(s) changed.\n")),
    }
    out
}
