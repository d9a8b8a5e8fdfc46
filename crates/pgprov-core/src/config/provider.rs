//! Where the managed server is and how to reach it.
//!
//! The server is located by, in order: a URL read from the environment
//! variable named in `database_url_env`, a literal `database_url`, or the
//! discrete `host`/`port`/`username`/`password` fields. Grants span several
//! databases, so the database part of the location is always chosen per
//! connection. The discrete fields go to the driver as they are and are
//! never spliced into a URL.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::env;

use crate::{PrivilegeError, parse_server_version};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of an environment variable holding a `postgres://` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default database. Catalogs connect to the database each grant names
    /// instead.
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Read the password from this variable when it is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default)]
    pub ssl_mode: SslMode,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Treat the server as this version (e.g. `"16.2"`) without asking it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            database_url_env: None,
            database_url: None,
            host: default_host(),
            port: default_port(),
            database: default_database(),
            username: default_username(),
            password: None,
            password_env: None,
            ssl_mode: SslMode::default(),
            connect_timeout_seconds: default_connect_timeout(),
            expected_version: None,
        }
    }
}

impl ProviderConfig {
    /// Configured URL pointing at `database`, or `None` when the server is
    /// described by the discrete fields.
    ///
    /// A URL given through `database_url_env` or `database_url` keeps its
    /// credentials and query parameters; only its path is replaced.
    pub fn url_for(&self, database: &str) -> Option<String> {
        self.database_url_env
            .as_deref()
            .and_then(|var| env::var(var).ok())
            .or_else(|| self.database_url.clone())
            .map(|url| replace_url_database(&url, database))
    }

    /// Password from `password_env` when that variable is set, else `password`.
    pub fn resolved_password(&self) -> Option<String> {
        self.password_env
            .as_deref()
            .and_then(|var| env::var(var).ok())
            .or_else(|| self.password.clone())
    }

    /// `expected_version` parsed, if set.
    pub fn expected_version(&self) -> Result<Option<Version>, PrivilegeError> {
        self.expected_version
            .as_deref()
            .map(parse_server_version)
            .transpose()
    }
}

/// Swap the path of `url` for `/database`, keeping any `?query`.
fn replace_url_database(url: &str, database: &str) -> String {
    let (location, query) = match url.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (url, None),
    };
    let authority = location.find("://").map_or(0, |i| i + 3);
    let server = match location[authority..].find('/') {
        Some(slash) => &location[..authority + slash],
        None => location,
    };

    match query {
        Some(query) => format!("{server}/{database}?{query}"),
        None => format!("{server}/{database}"),
    }
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "postgres".into()
}

fn default_username() -> String {
    "postgres".into()
}

fn default_connect_timeout() -> u64 {
    180
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_fields_yield_no_url() {
        let config = ProviderConfig {
            host: "db.internal".to_string(),
            password: Some("p@ss/w#rd".to_string()),
            ..Default::default()
        };
        assert_eq!(config.url_for("shop"), None);
        assert_eq!(config.resolved_password().as_deref(), Some("p@ss/w#rd"));
    }

    #[test]
    fn unset_password_variable_falls_back_to_password() {
        let config = ProviderConfig {
            password: Some("s3cret".to_string()),
            password_env: Some("PGPROV_TEST_PASSWORD_THAT_IS_NOT_SET".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolved_password().as_deref(), Some("s3cret"));
        assert_eq!(ProviderConfig::default().resolved_password(), None);
    }

    #[test]
    fn explicit_url_keeps_credentials_and_options() {
        let config = ProviderConfig {
            database_url: Some(
                "postgres://admin:pw@pg.example.com:6432/postgres?sslmode=require".to_string(),
            ),
            host: "not-used".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.url_for("shop").as_deref(),
            Some("postgres://admin:pw@pg.example.com:6432/shop?sslmode=require")
        );
    }

    #[test]
    fn url_without_path_gains_one() {
        assert_eq!(
            replace_url_database("postgres://pg.example.com", "shop"),
            "postgres://pg.example.com/shop"
        );
    }

    #[test]
    fn unset_url_variable_falls_through() {
        let config = ProviderConfig {
            database_url_env: Some("PGPROV_TEST_URL_THAT_IS_NOT_SET".to_string()),
            database_url: Some("postgres://fallback/postgres".to_string()),
            ..Default::default()
        };
        assert_eq!(config.url_for("shop").as_deref(), Some("postgres://fallback/shop"));
    }

    #[test]
    fn expected_version_is_parsed() {
        let mut config = ProviderConfig::default();
        assert_eq!(config.expected_version().unwrap(), None);

        config.expected_version = Some("16.2".to_string());
        assert_eq!(
            config.expected_version().unwrap(),
            Some(Version::new(16, 2, 0))
        );

        config.expected_version = Some("latest".to_string());
        assert!(config.expected_version().is_err());
    }

    #[test]
    fn ssl_modes_use_libpq_spelling() {
        let mode: SslMode = serde_yaml::from_str("verify-ca").unwrap();
        assert_eq!(mode, SslMode::VerifyCa);
        assert_eq!(serde_yaml::to_string(&SslMode::VerifyFull).unwrap().trim(), "verify-full");
        assert_eq!(SslMode::default(), SslMode::Prefer);
    }
}
