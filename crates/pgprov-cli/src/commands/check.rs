//! `pgprov check` command implementation.
//!
//! Validates a manifest without connecting to the server.

use anyhow::Result;
use pgprov_core::{ConfigError, Manifest, Version, parse_server_version};

/// Version assumed when neither `--server-version` nor `expected_version` is given.
const DEFAULT_CHECK_VERSION: Version = Version::new(17, 0, 0);

/// Validate `manifest` and return the report to print.
///
/// Fails with every problem found when the manifest is invalid.
pub fn run(manifest: &Manifest, server_version: Option<&str>) -> Result<String> {
    let version = match server_version {
        Some(raw) => parse_server_version(raw)?,
        None => manifest
            .provider
            .expected_version()?
            .unwrap_or(DEFAULT_CHECK_VERSION),
    };

    match manifest.validate(&version) {
        Ok(()) => Ok(format!(
            "✔ {} grant(s) valid for PostgreSQL {}",
            manifest.grants.len(),
            version
        )),
        Err(ConfigError::Invalid(errors)) => {
            let mut msg = format!("{} problem(s) found:", errors.len());
            for e in &errors {
                msg.push_str("\n  ✘ ");
                msg.push_str(e);
            }
            anyhow::bail!(msg)
        }
        Err(e) => Err(e.into()),
    }
}
