use anyhow::Context;
use async_trait::async_trait;
use pgprov_core::{
    GrantDefinition, GrantedPrivileges, ProviderConfig, SslMode, Version, parse_server_version,
};
use pgprov_runtime::GrantCatalog;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{Executor, PgPool, Row};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

mod acl;

use acl::{Param, acl_queries};

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// Driver options for `database` on the server described by `config`.
fn connect_options(config: &ProviderConfig, database: &str) -> anyhow::Result<PgConnectOptions> {
    let options = match config.url_for(database) {
        Some(url) => PgConnectOptions::from_str(&url).context("invalid database URL")?,
        None => {
            let options = PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.username);
            match config.resolved_password() {
                Some(password) => options.password(&password),
                None => options,
            }
        }
    };
    Ok(options.database(database).ssl_mode(pg_ssl_mode(config.ssl_mode)))
}

/// [`GrantCatalog`] backed by one PostgreSQL database.
///
/// Schema-scoped ACLs are per database, so a catalog is bound to the database
/// its grants live in.
pub struct PostgresCatalog {
    pool: PgPool,
    database: String,
}

impl PostgresCatalog {
    /// Connect to `database` on the server described by `config`.
    pub async fn connect(config: &ProviderConfig, database: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_with(connect_options(config, database)?)
            .await
            .with_context(|| format!("failed to connect to database '{database}'"))?;

        tracing::debug!(database = %database, "connected");
        Ok(Self {
            pool,
            database: database.to_string(),
        })
    }
}

#[async_trait]
impl GrantCatalog for PostgresCatalog {
    async fn server_version(&self) -> anyhow::Result<Version> {
        let raw: String = sqlx::query_scalar("SELECT current_setting('server_version')")
            .fetch_one(&self.pool)
            .await?;
        Ok(parse_server_version(&raw)?)
    }

    async fn granted_privileges(
        &self,
        definition: &GrantDefinition,
    ) -> anyhow::Result<BTreeMap<String, GrantedPrivileges>> {
        let mut granted: BTreeMap<String, GrantedPrivileges> = BTreeMap::new();

        for query in acl_queries(definition) {
            tracing::debug!(sql = %query.sql, "reading privileges");

            let mut q = sqlx::query(&query.sql);
            for param in &query.params {
                q = match param {
                    Param::Text(value) => q.bind(value.as_str()),
                    Param::TextArray(values) => q.bind(values.as_slice()),
                };
            }

            for row in q.fetch_all(&self.pool).await? {
                let name: String = row.try_get("name")?;
                let privileges: Vec<String> = row.try_get("privileges")?;
                let grantable: Vec<String> = row.try_get("grantable")?;

                let held = granted.entry(query.key.clone().unwrap_or(name)).or_default();
                held.privileges.extend(privileges.into_iter().map(Into::into));
                held.grantable.extend(grantable.into_iter().map(Into::into));
            }
        }

        Ok(granted)
    }

    async fn apply(&self, statements: &[String]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            tracing::info!(database = %self.database, sql = %statement, "executing");
            Executor::execute(&mut *tx, sqlx::raw_sql(statement))
                .await
                .with_context(|| format!("statement failed: {statement}"))?;
        }
        tx.commit().await?;
        Ok(())
    }
}
