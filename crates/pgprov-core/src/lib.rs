//! # pgprov-core
//!
//! Privilege model for declarative PostgreSQL grant management.
//!
//! The central question this crate answers is whether the privileges a role
//! currently holds on an object are exactly the ones that were declared. The
//! `ALL` alias makes that version dependent: on PostgreSQL 17 and later `ALL`
//! on a table includes `MAINTAIN`, before that it does not.
//!
//! ```
//! use pgprov_core::{DesiredPrivileges, ObjectType, PrivilegeSet, Version, privileges_equal};
//!
//! let granted: PrivilegeSet = ["CREATE", "USAGE"].into_iter().collect();
//! let desired = DesiredPrivileges::parse(["ALL"]).unwrap();
//!
//! assert!(privileges_equal(&granted, &desired, ObjectType::Schema, &Version::new(17, 0, 0)));
//! ```

pub mod config;
pub mod error;
pub mod expansion;
pub mod object_type;
pub mod privilege;
pub mod reconcile;
pub mod sql;
pub mod version;

pub use config::{ConfigError, GrantDefinition, Manifest, ProviderConfig, SslMode};
pub use error::PrivilegeError;
pub use expansion::{EXPANSION_TABLE, ExpansionRule, expand_all};
pub use object_type::ObjectType;
pub use privilege::{
    ALL_PRIVILEGES, DesiredPrivileges, GrantedPrivileges, Privilege, PrivilegeSet,
};
pub use reconcile::privileges_equal;
pub use sql::{
    captures_by_name, quote_ident, quote_role, quote_routine, quote_table_name, render_grant,
    render_revoke,
};
pub use version::parse_server_version;

/// Re-exported so callers can name server versions without a direct dependency.
pub use semver::Version;
