//! Kinds of database objects privileges can be granted on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PrivilegeError;

/// Object kind a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Database,
    Schema,
    Table,
    Sequence,
    Function,
    Procedure,
    Routine,
    Column,
    ForeignDataWrapper,
    ForeignServer,
    Type,
}

impl ObjectType {
    /// Every recognized object type, in declaration order.
    pub const ALL: [ObjectType; 11] = [
        ObjectType::Database,
        ObjectType::Schema,
        ObjectType::Table,
        ObjectType::Sequence,
        ObjectType::Function,
        ObjectType::Procedure,
        ObjectType::Routine,
        ObjectType::Column,
        ObjectType::ForeignDataWrapper,
        ObjectType::ForeignServer,
        ObjectType::Type,
    ];

    /// Configuration name (`foreign_data_wrapper`, `table`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Database => "database",
            ObjectType::Schema => "schema",
            ObjectType::Table => "table",
            ObjectType::Sequence => "sequence",
            ObjectType::Function => "function",
            ObjectType::Procedure => "procedure",
            ObjectType::Routine => "routine",
            ObjectType::Column => "column",
            ObjectType::ForeignDataWrapper => "foreign_data_wrapper",
            ObjectType::ForeignServer => "foreign_server",
            ObjectType::Type => "type",
        }
    }

    /// Keyword used in `GRANT ... ON <keyword> name`.
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            ObjectType::Database => "DATABASE",
            ObjectType::Schema => "SCHEMA",
            ObjectType::Table | ObjectType::Column => "TABLE",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::Function => "FUNCTION",
            ObjectType::Procedure => "PROCEDURE",
            ObjectType::Routine => "ROUTINE",
            ObjectType::ForeignDataWrapper => "FOREIGN DATA WRAPPER",
            ObjectType::ForeignServer => "FOREIGN SERVER",
            ObjectType::Type => "TYPE",
        }
    }

    /// Plural keyword for `ON ALL <keyword> IN SCHEMA`, when PostgreSQL has one.
    pub fn bulk_keyword(&self) -> Option<&'static str> {
        match self {
            ObjectType::Table => Some("TABLES"),
            ObjectType::Sequence => Some("SEQUENCES"),
            ObjectType::Function => Some("FUNCTIONS"),
            ObjectType::Procedure => Some("PROCEDURES"),
            ObjectType::Routine => Some("ROUTINES"),
            _ => None,
        }
    }

    /// Objects of this type live inside a schema.
    pub fn is_schema_scoped(&self) -> bool {
        matches!(
            self,
            ObjectType::Table
                | ObjectType::Sequence
                | ObjectType::Function
                | ObjectType::Procedure
                | ObjectType::Routine
                | ObjectType::Column
                | ObjectType::Type
        )
    }

    /// Objects are addressed by a call signature (`name(argtypes)`).
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            ObjectType::Function | ObjectType::Procedure | ObjectType::Routine
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = PrivilegeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PrivilegeError::UnknownObjectType(s.to_string()))
    }
}
