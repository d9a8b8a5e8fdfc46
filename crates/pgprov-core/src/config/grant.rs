//! Declared grants.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{DesiredPrivileges, ObjectType, PrivilegeError};

/// One grant to keep in place: `privileges` on some objects, held by `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDefinition {
    /// Grantee. `public` grants to every role.
    pub role: String,

    /// Database the objects live in (or the database being granted on).
    pub database: String,

    /// Schema of the objects. Required for schema-scoped object types and
    /// names the schema itself for `object_type: schema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub object_type: ObjectType,

    /// Objects to grant on. Empty means every object of the type in the
    /// schema. Routines are given with their signature (`refresh(integer)`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<String>,

    /// Columns for `object_type: column`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    /// Privilege tokens, or the single token `ALL`.
    pub privileges: Vec<String>,

    #[serde(default)]
    pub with_grant_option: bool,
}

impl GrantDefinition {
    /// Parse the declared privileges.
    pub fn desired(&self) -> Result<DesiredPrivileges, PrivilegeError> {
        DesiredPrivileges::parse(&self.privileges)
    }

    /// Stable identifier, `role_database_schema_objecttype`.
    pub fn id(&self) -> String {
        let mut parts = vec![self.role.as_str(), self.database.as_str()];
        if let Some(schema) = &self.schema {
            parts.push(schema);
        }
        parts.push(self.object_type.as_str());
        parts.join("_")
    }

    /// Short human-readable description for logs and reports.
    pub fn label(&self) -> String {
        let scope = match (&self.schema, self.objects.is_empty()) {
            (Some(schema), true) => format!("{}.{}.*", self.database, schema),
            (Some(schema), false) => {
                format!("{}.{}.{}", self.database, schema, self.objects.join(","))
            }
            (None, true) => self.database.clone(),
            (None, false) => format!("{}:{}", self.database, self.objects.join(",")),
        };
        format!("{} {} for {}", self.object_type, scope, self.role)
    }

    /// All problems with this definition, checked against `version`.
    pub fn validate(&self, version: &Version) -> Vec<String> {
        let mut errors = Vec::new();
        let t = self.object_type;

        if self.role.trim().is_empty() {
            errors.push("role must not be empty".to_string());
        }
        if self.database.trim().is_empty() {
            errors.push("database must not be empty".to_string());
        }

        let needs_schema = t == ObjectType::Schema || t.is_schema_scoped();
        match (needs_schema, self.schema.is_some()) {
            (true, false) => errors.push(format!("schema is required for object_type {t}")),
            (false, true) => errors.push(format!("schema must not be set for object_type {t}")),
            _ => {}
        }

        match t {
            ObjectType::Database | ObjectType::Schema if !self.objects.is_empty() => {
                errors.push(format!("objects must not be set for object_type {t}"));
            }
            ObjectType::ForeignDataWrapper | ObjectType::ForeignServer | ObjectType::Type
                if self.objects.is_empty() =>
            {
                errors.push(format!("objects must list at least one {t}"));
            }
            ObjectType::Column if self.objects.len() != 1 => {
                errors.push("object_type column requires exactly one table in objects".to_string());
            }
            _ => {}
        }

        if t == ObjectType::Column {
            if self.columns.is_empty() {
                errors.push("columns are required for object_type column".to_string());
            }
        } else if !self.columns.is_empty() {
            errors.push(format!("columns must not be set for object_type {t}"));
        }

        match self.desired() {
            Ok(desired) => {
                if let Err(e) = desired.validate(t, version) {
                    errors.push(e.to_string());
                }
            }
            Err(e) => errors.push(e.to_string()),
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v17() -> Version {
        Version::new(17, 0, 0)
    }

    fn table_grant() -> GrantDefinition {
        GrantDefinition {
            role: "reporting".to_string(),
            database: "analytics".to_string(),
            schema: Some("public".to_string()),
            object_type: ObjectType::Table,
            objects: vec![],
            columns: vec![],
            privileges: vec!["ALL".to_string()],
            with_grant_option: false,
        }
    }

    #[test]
    fn valid_table_grant() {
        assert!(table_grant().validate(&v17()).is_empty());
        assert_eq!(table_grant().id(), "reporting_analytics_public_table");
        assert_eq!(table_grant().label(), "table analytics.public.* for reporting");
    }

    #[test]
    fn table_requires_schema() {
        let grant = GrantDefinition {
            schema: None,
            ..table_grant()
        };
        assert_eq!(
            grant.validate(&v17()),
            vec!["schema is required for object_type table".to_string()]
        );
    }

    #[test]
    fn database_rejects_schema_and_bad_privileges() {
        let grant = GrantDefinition {
            object_type: ObjectType::Database,
            privileges: vec!["USAGE".to_string()],
            ..table_grant()
        };
        let errors = grant.validate(&v17());
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("schema must not be set"));
        assert!(errors[1].contains("USAGE is not valid for object type database"));
    }

    #[test]
    fn column_grant_shape() {
        let grant = GrantDefinition {
            object_type: ObjectType::Column,
            objects: vec!["orders".to_string()],
            columns: vec!["total".to_string()],
            privileges: vec!["SELECT".to_string()],
            ..table_grant()
        };
        assert!(grant.validate(&v17()).is_empty());

        let missing_columns = GrantDefinition {
            columns: vec![],
            ..grant
        };
        assert_eq!(
            missing_columns.validate(&v17()),
            vec!["columns are required for object_type column".to_string()]
        );
    }

    #[test]
    fn mixed_all_is_reported() {
        let grant = GrantDefinition {
            privileges: vec!["ALL".to_string(), "SELECT".to_string()],
            ..table_grant()
        };
        let errors = grant.validate(&v17());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'ALL' cannot be combined"));
    }

    #[test]
    fn foreign_server_requires_objects() {
        let grant = GrantDefinition {
            object_type: ObjectType::ForeignServer,
            schema: None,
            privileges: vec!["USAGE".to_string()],
            ..table_grant()
        };
        assert_eq!(
            grant.validate(&v17()),
            vec!["objects must list at least one foreign_server".to_string()]
        );
    }
}
