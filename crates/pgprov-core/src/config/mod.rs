//! Configuration types for pgprov.
//!
//! A manifest is a single YAML file holding the connection settings for the
//! target PostgreSQL server and the list of grants to keep in place:
//!
//! ```yaml
//! provider:
//!   host: db.internal
//!   username: admin
//!   password_env: PGPROV_PASSWORD
//! grants:
//!   - role: reporting
//!     database: analytics
//!     schema: public
//!     object_type: table
//!     privileges: [ALL]
//! ```

pub mod grant;
pub mod manifest;
pub mod provider;

pub use grant::GrantDefinition;
pub use manifest::Manifest;
pub use provider::{ProviderConfig, SslMode};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Privilege(#[from] crate::PrivilegeError),
}
