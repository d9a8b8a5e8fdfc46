//! Server version parsing.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::PrivilegeError;

static LEADING_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version pattern must compile")
});

/// Parse the text PostgreSQL reports for `SHOW server_version`.
///
/// Only the leading numeric components are used, so distribution suffixes and
/// pre-release tags (`17.0 (Debian 17.0-1)`, `18beta1`) are accepted. Missing
/// minor or patch components default to zero.
pub fn parse_server_version(raw: &str) -> Result<Version, PrivilegeError> {
    let invalid = || PrivilegeError::InvalidVersion(raw.to_string());

    let caps = LEADING_VERSION.captures(raw).ok_or_else(invalid)?;
    let component = |idx: usize| -> Result<u64, PrivilegeError> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().map_err(|_| invalid()),
            None => Ok(0),
        }
    };

    Ok(Version::new(component(1)?, component(2)?, component(3)?))
}
