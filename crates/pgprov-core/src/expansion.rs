//! What the `ALL` alias stands for, per object type and server version.
//!
//! The table is a list of threshold rules: a rule contributes its privileges
//! to every server version at or above `since`. Supporting a privilege added
//! by a new PostgreSQL release is a new row, not a new branch.

use semver::Version;

use crate::{ObjectType, PrivilegeSet};

/// One row of the expansion table.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionRule {
    pub object_type: ObjectType,
    /// First server version (major, minor, patch) the privileges exist in.
    pub since: (u64, u64, u64),
    pub privileges: &'static [&'static str],
}

impl ExpansionRule {
    const fn new(
        object_type: ObjectType,
        since: (u64, u64, u64),
        privileges: &'static [&'static str],
    ) -> Self {
        Self {
            object_type,
            since,
            privileges,
        }
    }

    /// Whether this rule is in force on `version`.
    pub fn applies_to(&self, version: &Version) -> bool {
        let (major, minor, patch) = self.since;
        (version.major, version.minor, version.patch) >= (major, minor, patch)
    }
}

const ANY: (u64, u64, u64) = (0, 0, 0);

/// Privileges named by `ALL`, keyed by object type and ordered by `since`.
pub static EXPANSION_TABLE: &[ExpansionRule] = &[
    ExpansionRule::new(ObjectType::Database, ANY, &["CONNECT", "CREATE", "TEMPORARY"]),
    ExpansionRule::new(ObjectType::Schema, ANY, &["CREATE", "USAGE"]),
    ExpansionRule::new(
        ObjectType::Table,
        ANY,
        &[
            "SELECT",
            "INSERT",
            "UPDATE",
            "DELETE",
            "TRUNCATE",
            "REFERENCES",
            "TRIGGER",
        ],
    ),
    ExpansionRule::new(ObjectType::Table, (17, 0, 0), &["MAINTAIN"]),
    ExpansionRule::new(ObjectType::Sequence, ANY, &["USAGE", "SELECT", "UPDATE"]),
    ExpansionRule::new(ObjectType::Function, ANY, &["EXECUTE"]),
    ExpansionRule::new(ObjectType::Procedure, ANY, &["EXECUTE"]),
    ExpansionRule::new(ObjectType::Routine, ANY, &["EXECUTE"]),
    ExpansionRule::new(
        ObjectType::Column,
        ANY,
        &["SELECT", "INSERT", "UPDATE", "REFERENCES"],
    ),
    ExpansionRule::new(ObjectType::ForeignDataWrapper, ANY, &["USAGE"]),
    ExpansionRule::new(ObjectType::ForeignServer, ANY, &["USAGE"]),
    ExpansionRule::new(ObjectType::Type, ANY, &["USAGE"]),
];

/// Concrete privileges `ALL` denotes for `object_type` on a server at `version`.
pub fn expand_all(object_type: ObjectType, version: &Version) -> PrivilegeSet {
    EXPANSION_TABLE
        .iter()
        .filter(|rule| rule.object_type == object_type && rule.applies_to(version))
        .flat_map(|rule| rule.privileges.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn set(tokens: &[&str]) -> PrivilegeSet {
        tokens.iter().copied().collect()
    }

    #[test]
    fn table_gains_maintain_on_17() {
        let base = set(&[
            "SELECT",
            "INSERT",
            "UPDATE",
            "DELETE",
            "TRUNCATE",
            "REFERENCES",
            "TRIGGER",
        ]);
        assert_eq!(expand_all(ObjectType::Table, &v("16.0.0")), base);
        assert_eq!(expand_all(ObjectType::Table, &v("16.9.3")), base);

        let mut with_maintain = base.clone();
        with_maintain.insert("MAINTAIN");
        assert_eq!(expand_all(ObjectType::Table, &v("17.0.0")), with_maintain);
        assert_eq!(expand_all(ObjectType::Table, &v("18.1.0")), with_maintain);
    }

    #[test]
    fn database_and_schema_are_version_independent() {
        for version in ["9.6.0", "16.0.0", "17.0.0"] {
            assert_eq!(
                expand_all(ObjectType::Database, &v(version)),
                set(&["CONNECT", "CREATE", "TEMPORARY"])
            );
            assert_eq!(
                expand_all(ObjectType::Schema, &v(version)),
                set(&["CREATE", "USAGE"])
            );
        }
    }

    #[test]
    fn every_object_type_has_a_base_rule() {
        for t in ObjectType::ALL {
            assert!(
                !expand_all(t, &v("0.0.0")).is_empty(),
                "no base expansion for {t}"
            );
        }
    }

    #[test]
    fn expansion_is_monotonic_in_version() {
        let versions = ["0.0.0", "9.6.0", "12.0.0", "16.0.0", "16.9.9", "17.0.0", "18.0.0"];
        for t in ObjectType::ALL {
            for pair in versions.windows(2) {
                let older = expand_all(t, &v(pair[0]));
                let newer = expand_all(t, &v(pair[1]));
                assert!(
                    older.difference(&newer).is_empty(),
                    "{t}: {older} not contained in {newer}"
                );
            }
        }
    }

    #[test]
    fn rules_are_ordered_by_since_within_a_type() {
        for t in ObjectType::ALL {
            let thresholds: Vec<_> = EXPANSION_TABLE
                .iter()
                .filter(|r| r.object_type == t)
                .map(|r| r.since)
                .collect();
            assert!(thresholds.windows(2).all(|w| w[0] <= w[1]), "{t}: {thresholds:?}");
        }
    }

    #[test]
    fn no_rule_contains_the_alias_itself() {
        assert!(
            EXPANSION_TABLE
                .iter()
                .all(|r| !r.privileges.contains(&crate::ALL_PRIVILEGES))
        );
    }
}
