//! Catalog queries that read a role's privileges out of PostgreSQL ACLs.
//!
//! Every query returns `(name text, privileges text[], grantable text[])`
//! rows, one per object, including objects on which the role holds nothing. `$1` is always the
//! grantee; `PUBLIC` maps to the pseudo-role oid 0.

use pgprov_core::{GrantDefinition, ObjectType, quote_routine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Param {
    Text(String),
    TextArray(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AclQuery {
    pub sql: String,
    pub params: Vec<Param>,
    /// Report rows under this name instead of the catalog's.
    pub key: Option<String>,
}

struct AclSource {
    from: &'static str,
    name: &'static str,
    acl: &'static str,
}

const DATABASES: AclSource = AclSource {
    from: "pg_database d",
    name: "d.datname",
    acl: "COALESCE(d.datacl, acldefault('d', d.datdba))",
};

const SCHEMAS: AclSource = AclSource {
    from: "pg_namespace n",
    name: "n.nspname",
    acl: "COALESCE(n.nspacl, acldefault('n', n.nspowner))",
};

const RELATIONS: AclSource = AclSource {
    from: "pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace",
    name: "c.relname",
    acl: "COALESCE(c.relacl, acldefault('r', c.relowner))",
};

const SEQUENCES: AclSource = AclSource {
    from: "pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace",
    name: "c.relname",
    acl: "COALESCE(c.relacl, acldefault('s', c.relowner))",
};

const ROUTINES: AclSource = AclSource {
    from: "pg_proc p JOIN pg_namespace n ON n.oid = p.pronamespace",
    name: "p.proname || '(' || pg_get_function_identity_arguments(p.oid) || ')'",
    acl: "COALESCE(p.proacl, acldefault('f', p.proowner))",
};

const COLUMNS: AclSource = AclSource {
    from: "pg_attribute a JOIN pg_class c ON c.oid = a.attrelid JOIN pg_namespace n ON n.oid = c.relnamespace",
    name: "a.attname",
    acl: "COALESCE(a.attacl, '{}'::aclitem[])",
};

const WRAPPERS: AclSource = AclSource {
    from: "pg_foreign_data_wrapper w",
    name: "w.fdwname",
    acl: "COALESCE(w.fdwacl, acldefault('F', w.fdwowner))",
};

const SERVERS: AclSource = AclSource {
    from: "pg_foreign_server s",
    name: "s.srvname",
    acl: "COALESCE(s.srvacl, acldefault('S', s.srvowner))",
};

const TYPES: AclSource = AclSource {
    from: "pg_type t JOIN pg_namespace n ON n.oid = t.typnamespace",
    name: "t.typname",
    acl: "COALESCE(t.typacl, acldefault('T', t.typowner))",
};

impl AclSource {
    fn select(&self, filter: &str) -> String {
        format!(
            "SELECT ({name})::text AS name, \
             COALESCE(array_agg(acl.privilege_type) FILTER (WHERE acl.grantee = g.oid), '{{}}') AS privileges, \
             COALESCE(array_agg(acl.privilege_type) FILTER (WHERE acl.grantee = g.oid AND acl.is_grantable), '{{}}') AS grantable \
             FROM {from} \
             CROSS JOIN (SELECT CASE WHEN lower($1) = 'public' THEN 0::oid \
             ELSE (SELECT oid FROM pg_roles WHERE rolname = $1) END AS oid) g \
             LEFT JOIN LATERAL aclexplode({acl}) acl ON true \
             WHERE {filter} \
             GROUP BY {name}",
            name = self.name,
            from = self.from,
            acl = self.acl,
            filter = filter,
        )
    }
}

fn prokinds(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::Procedure => "('p')",
        ObjectType::Routine => "('f', 'a', 'w', 'p')",
        _ => "('f', 'a', 'w')",
    }
}

/// Queries that together report the privileges `definition` is about.
pub(crate) fn acl_queries(definition: &GrantDefinition) -> Vec<AclQuery> {
    let role = Param::Text(definition.role.clone());
    let schema = definition.schema.clone().unwrap_or_default();
    let objects = Param::TextArray(definition.objects.clone());
    let single = |sql: String, params: Vec<Param>| {
        vec![AclQuery {
            sql,
            params,
            key: None,
        }]
    };

    match definition.object_type {
        ObjectType::Database => single(
            DATABASES.select("d.datname = $2"),
            vec![role, Param::Text(definition.database.clone())],
        ),
        ObjectType::Schema => single(
            SCHEMAS.select("n.nspname = $2"),
            vec![role, Param::Text(schema)],
        ),
        ObjectType::Table => single(
            RELATIONS.select(
                "n.nspname = $2 AND c.relkind IN ('r', 'p', 'v', 'm', 'f') \
                 AND (cardinality($3::text[]) = 0 OR c.relname = ANY($3))",
            ),
            vec![role, Param::Text(schema), objects],
        ),
        ObjectType::Sequence => single(
            SEQUENCES.select(
                "n.nspname = $2 AND c.relkind = 'S' \
                 AND (cardinality($3::text[]) = 0 OR c.relname = ANY($3))",
            ),
            vec![role, Param::Text(schema), objects],
        ),
        t @ (ObjectType::Function | ObjectType::Procedure | ObjectType::Routine) => {
            if definition.objects.is_empty() {
                let filter = format!("n.nspname = $2 AND p.prokind IN {}", prokinds(t));
                return single(ROUTINES.select(&filter), vec![role, Param::Text(schema)]);
            }
            // Signatures are resolved by the server so `int4` and `integer` agree.
            definition
                .objects
                .iter()
                .map(|signature| AclQuery {
                    sql: ROUTINES.select("p.oid = to_regprocedure($2)"),
                    params: vec![
                        role.clone(),
                        Param::Text(quote_routine(&schema, signature)),
                    ],
                    key: Some(signature.clone()),
                })
                .collect()
        }
        ObjectType::Column => single(
            COLUMNS.select(
                "n.nspname = $2 AND c.relname = $3 AND a.attnum > 0 \
                 AND NOT a.attisdropped AND a.attname = ANY($4)",
            ),
            vec![
                role,
                Param::Text(schema),
                Param::Text(definition.objects.first().cloned().unwrap_or_default()),
                Param::TextArray(definition.columns.clone()),
            ],
        ),
        ObjectType::ForeignDataWrapper => {
            single(WRAPPERS.select("w.fdwname = ANY($2)"), vec![role, objects])
        }
        ObjectType::ForeignServer => {
            single(SERVERS.select("s.srvname = ANY($2)"), vec![role, objects])
        }
        ObjectType::Type => single(
            TYPES.select("n.nspname = $2 AND t.typname = ANY($3)"),
            vec![role, Param::Text(schema), objects],
        ),
    }
}
