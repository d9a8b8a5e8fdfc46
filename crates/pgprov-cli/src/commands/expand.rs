//! Offline privilege commands.
//!
//! `pgprov expand` - show what `ALL` stands for.
//! `pgprov compare` - compare a granted list with a desired one.

use pgprov_core::{DesiredPrivileges, ObjectType, PrivilegeSet, expand_all, parse_server_version};

/// Privileges `ALL` denotes for `object_type` on `server_version`.
pub fn expand(object_type: ObjectType, server_version: &str) -> anyhow::Result<PrivilegeSet> {
    let version = parse_server_version(server_version)?;
    Ok(expand_all(object_type, &version))
}

#[derive(Debug)]
pub struct Comparison {
    pub in_sync: bool,
    pub desired: PrivilegeSet,
    pub missing: PrivilegeSet,
    pub extra: PrivilegeSet,
}

pub fn compare(
    object_type: ObjectType,
    server_version: &str,
    granted: &[String],
    desired: &[String],
) -> anyhow::Result<Comparison> {
    let version = parse_server_version(server_version)?;
    let desired = DesiredPrivileges::parse(desired)?;
    desired.validate(object_type, &version)?;

    let granted: PrivilegeSet = granted.iter().map(|p| p.trim().to_string()).collect();
    let in_sync = pgprov_core::privileges_equal(&granted, &desired, object_type, &version);
    let effective = desired.effective(object_type, &version);

    Ok(Comparison {
        in_sync,
        missing: effective.difference(&granted),
        extra: granted.difference(&effective),
        desired: effective,
    })
}

/// Human-readable summary of a comparison.
pub fn render(comparison: &Comparison) -> String {
    let mut out = String::new();
    if comparison.in_sync {
        out.push_str(&format!("✔ in sync: {}\n", comparison.desired));
    } else {
        out.push_str(&format!("✘ drift: desired {}\n", comparison.desired));
        if !comparison.missing.is_empty() {
            out.push_str(&format!("  missing: {}\n", comparison.missing));
        }
        if !comparison.extra.is_empty() {
            out.push_str(&format!("  extra:   {}\n", comparison.extra));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expand_table_on_17() {
        let set = expand(ObjectType::Table, "17.2").unwrap();
        assert!(set.contains("MAINTAIN"));
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn expand_rejects_bad_versions() {
        assert!(expand(ObjectType::Table, "unknown").is_err());
    }

    #[test]
    fn compare_reports_missing_privileges() {
        let result = compare(
            ObjectType::Table,
            "17.0",
            &tokens(&[
                "SELECT",
                "INSERT",
                "UPDATE",
                "DELETE",
                "TRUNCATE",
                "REFERENCES",
                "TRIGGER",
            ]),
            &tokens(&["ALL"]),
        )
        .unwrap();
        assert!(!result.in_sync);
        assert_eq!(result.missing.join(","), "MAINTAIN");
        assert!(result.extra.is_empty());
        assert!(render(&result).contains("missing: [MAINTAIN]"));
    }

    #[test]
    fn compare_in_sync_schema() {
        let result = compare(
            ObjectType::Schema,
            "16.4",
            &tokens(&["USAGE", " CREATE"]),
            &tokens(&["ALL"]),
        )
        .unwrap();
        assert!(result.in_sync);
        assert_eq!(render(&result), "✔ in sync: [CREATE, USAGE]\n");
    }

    #[test]
    fn compare_rejects_mixed_all() {
        let err = compare(
            ObjectType::Schema,
            "16.4",
            &tokens(&["USAGE"]),
            &tokens(&["ALL", "USAGE"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("'ALL' cannot be combined"));
    }
}
