//! Error types for the privilege model.

use thiserror::Error;

use crate::ObjectType;

/// Errors raised while building or validating privilege inputs.
///
/// The reconciler itself never fails; these are surfaced by the parsers that
/// sit in front of it so malformed input is rejected instead of showing up as
/// drift.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivilegeError {
    /// Object type name is not one of the recognized kinds.
    #[error("unknown object type '{0}'")]
    UnknownObjectType(String),

    /// No privileges were declared.
    #[error("at least one privilege must be declared")]
    EmptyPrivileges,

    /// `ALL` was combined with explicit privileges.
    #[error("'ALL' cannot be combined with other privileges (got: {0})")]
    MixedAll(String),

    /// Privilege cannot be granted on this object type.
    #[error("privilege {privilege} is not valid for object type {object_type}")]
    NotAllowed {
        privilege: String,
        object_type: ObjectType,
    },

    /// Server version string could not be interpreted.
    #[error("invalid server version '{0}'")]
    InvalidVersion(String),
}
