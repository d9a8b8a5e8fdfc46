//! Identifier quoting and GRANT / REVOKE statement rendering.

use regex::Regex;
use std::collections::HashMap;

use crate::{GrantDefinition, ObjectType, PrivilegeSet};

/// Quote an identifier the way PostgreSQL expects.
///
/// Embedded double quotes are doubled. Anything after a NUL byte is dropped
/// since the server would truncate there anyway.
pub fn quote_ident(name: &str) -> String {
    let name = name.split('\0').next().unwrap_or_default();
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified name: `test.users` -> `"test"."users"`.
pub fn quote_table_name(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

/// Quote a grantee. `PUBLIC` is a keyword, not a role name.
pub fn quote_role(role: &str) -> String {
    if role.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(role)
    }
}

/// Named capture groups of the first match of `pattern` in `text`.
///
/// Returns an empty map when the pattern is invalid or does not match;
/// unmatched optional groups are left out.
pub fn captures_by_name(pattern: &str, text: &str) -> HashMap<String, String> {
    let Ok(re) = Regex::new(pattern) else {
        return HashMap::new();
    };
    let Some(caps) = re.captures(text) else {
        return HashMap::new();
    };

    re.capture_names()
        .flatten()
        .filter_map(|name| {
            caps.name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect()
}

/// Quote a schema-qualified routine reference, keeping its argument list:
/// `("public", "f(integer)")` -> `"public"."f"(integer)`.
pub fn quote_routine(schema: &str, signature: &str) -> String {
    match signature.split_once('(') {
        Some((name, args)) => format!("{}.{}({}", quote_ident(schema), quote_ident(name), args),
        None => format!("{}.{}", quote_ident(schema), quote_ident(signature)),
    }
}

/// The `ON ...` clause naming the objects a definition covers.
fn target_clause(grant: &GrantDefinition) -> String {
    let t = grant.object_type;
    let schema = grant.schema.as_deref().unwrap_or_default();

    match t {
        ObjectType::Database => format!("DATABASE {}", quote_ident(&grant.database)),
        ObjectType::Schema => format!("SCHEMA {}", quote_ident(schema)),
        ObjectType::ForeignDataWrapper | ObjectType::ForeignServer => {
            let names: Vec<String> = grant.objects.iter().map(|o| quote_ident(o)).collect();
            format!("{} {}", t.sql_keyword(), names.join(","))
        }
        _ => {
            if grant.objects.is_empty()
                && let Some(bulk) = t.bulk_keyword()
            {
                return format!("ALL {} IN SCHEMA {}", bulk, quote_ident(schema));
            }
            let names: Vec<String> = grant
                .objects
                .iter()
                .map(|o| {
                    if t.is_routine() {
                        quote_routine(schema, o)
                    } else {
                        format!("{}.{}", quote_ident(schema), quote_ident(o))
                    }
                })
                .collect();
            format!("{} {}", t.sql_keyword(), names.join(","))
        }
    }
}

fn column_list(grant: &GrantDefinition) -> String {
    grant
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",")
}

/// `GRANT <privileges> ON <target> TO <role>` for a definition.
pub fn render_grant(grant: &GrantDefinition, privileges: &PrivilegeSet) -> String {
    let what = if grant.object_type == ObjectType::Column {
        let columns = column_list(grant);
        privileges
            .iter()
            .map(|p| format!("{p} ({columns})"))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        privileges.join(",")
    };

    let mut sql = format!(
        "GRANT {} ON {} TO {}",
        what,
        target_clause(grant),
        quote_role(&grant.role)
    );
    if grant.with_grant_option {
        sql.push_str(" WITH GRANT OPTION");
    }
    sql
}

/// `REVOKE ALL PRIVILEGES ON <target> FROM <role>` for a definition.
pub fn render_revoke(grant: &GrantDefinition) -> String {
    let what = if grant.object_type == ObjectType::Column {
        format!("ALL PRIVILEGES ({})", column_list(grant))
    } else {
        "ALL PRIVILEGES".to_string()
    };

    format!(
        "REVOKE {} ON {} FROM {}",
        what,
        target_clause(grant),
        quote_role(&grant.role)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grant(object_type: ObjectType) -> GrantDefinition {
        GrantDefinition {
            role: "reporting".to_string(),
            database: "analytics".to_string(),
            schema: Some("public".to_string()),
            object_type,
            objects: vec![],
            columns: vec![],
            privileges: vec!["ALL".to_string()],
            with_grant_option: false,
        }
    }

    fn set(tokens: &[&str]) -> PrivilegeSet {
        tokens.iter().copied().collect()
    }

    #[test]
    fn test_captures_by_name() {
        let result = captures_by_name(r"(?si).*\$(?P<Body>.*)\$.*", "aa $something_to_extract$ bb");
        assert_eq!(
            result,
            HashMap::from([("Body".to_string(), "something_to_extract".to_string())])
        );
    }

    #[test]
    fn test_captures_by_name_without_match() {
        assert!(captures_by_name(r"(?P<n>\d+)", "no digits").is_empty());
        assert!(captures_by_name(r"(?P<n>", "bad pattern").is_empty());
    }

    #[test]
    fn test_quote_table_name() {
        let cases = [
            ("simple table name", "users", r#""users""#),
            ("table name with schema", "test.users", r#""test"."users""#),
        ];
        for (name, input, expected) in cases {
            assert_eq!(quote_table_name(input), expected, "{name}");
        }
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(quote_ident("cut\0here"), r#""cut""#);
        assert_eq!(quote_role("Public"), "PUBLIC");
        assert_eq!(quote_role("app"), r#""app""#);
    }

    #[test]
    fn renders_database_grant() {
        let mut g = grant(ObjectType::Database);
        g.schema = None;
        assert_eq!(
            render_grant(&g, &set(&["CONNECT", "TEMPORARY"])),
            r#"GRANT CONNECT,TEMPORARY ON DATABASE "analytics" TO "reporting""#
        );
        assert_eq!(
            render_revoke(&g),
            r#"REVOKE ALL PRIVILEGES ON DATABASE "analytics" FROM "reporting""#
        );
    }

    #[test]
    fn renders_schema_grant_with_grant_option() {
        let mut g = grant(ObjectType::Schema);
        g.with_grant_option = true;
        assert_eq!(
            render_grant(&g, &set(&["USAGE"])),
            r#"GRANT USAGE ON SCHEMA "public" TO "reporting" WITH GRANT OPTION"#
        );

        g.with_grant_option = false;
        g.role = "public".to_string();
        assert_eq!(
            render_revoke(&g),
            r#"REVOKE ALL PRIVILEGES ON SCHEMA "public" FROM PUBLIC"#
        );
    }

    #[test]
    fn renders_bulk_table_grant() {
        let g = grant(ObjectType::Table);
        assert_eq!(
            render_grant(&g, &set(&["SELECT", "INSERT"])),
            r#"GRANT INSERT,SELECT ON ALL TABLES IN SCHEMA "public" TO "reporting""#
        );
        assert_eq!(
            render_revoke(&g),
            r#"REVOKE ALL PRIVILEGES ON ALL TABLES IN SCHEMA "public" FROM "reporting""#
        );
    }

    #[test]
    fn renders_listed_sequences() {
        let mut g = grant(ObjectType::Sequence);
        g.objects = vec!["a_seq".to_string(), "b_seq".to_string()];
        assert_eq!(
            render_grant(&g, &set(&["USAGE"])),
            r#"GRANT USAGE ON SEQUENCE "public"."a_seq","public"."b_seq" TO "reporting""#
        );
    }

    #[test]
    fn renders_routine_signatures() {
        let mut g = grant(ObjectType::Function);
        g.objects = vec!["refresh(integer, text)".to_string()];
        assert_eq!(
            render_grant(&g, &set(&["EXECUTE"])),
            r#"GRANT EXECUTE ON FUNCTION "public"."refresh"(integer, text) TO "reporting""#
        );

        let g = grant(ObjectType::Procedure);
        assert_eq!(
            render_revoke(&g),
            r#"REVOKE ALL PRIVILEGES ON ALL PROCEDURES IN SCHEMA "public" FROM "reporting""#
        );
    }

    #[test]
    fn renders_column_grant() {
        let mut g = grant(ObjectType::Column);
        g.objects = vec!["orders".to_string()];
        g.columns = vec!["id".to_string(), "total".to_string()];
        assert_eq!(
            render_grant(&g, &set(&["SELECT", "UPDATE"])),
            r#"GRANT SELECT ("id","total"),UPDATE ("id","total") ON TABLE "public"."orders" TO "reporting""#
        );
        assert_eq!(
            render_revoke(&g),
            r#"REVOKE ALL PRIVILEGES ("id","total") ON TABLE "public"."orders" FROM "reporting""#
        );
    }

    #[test]
    fn renders_foreign_objects_and_types() {
        let mut g = grant(ObjectType::ForeignServer);
        g.schema = None;
        g.objects = vec!["remote".to_string()];
        assert_eq!(
            render_grant(&g, &set(&["USAGE"])),
            r#"GRANT USAGE ON FOREIGN SERVER "remote" TO "reporting""#
        );

        let mut g = grant(ObjectType::Type);
        g.objects = vec!["mood".to_string()];
        assert_eq!(
            render_grant(&g, &set(&["USAGE"])),
            r#"GRANT USAGE ON TYPE "public"."mood" TO "reporting""#
        );
    }
}
