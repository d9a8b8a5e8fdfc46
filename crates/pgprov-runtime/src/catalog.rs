use async_trait::async_trait;
use pgprov_core::{GrantDefinition, GrantedPrivileges, Version};
use std::collections::BTreeMap;

#[async_trait]
pub trait GrantCatalog: Send + Sync {
    /// Version of the server the grants live on.
    async fn server_version(&self) -> anyhow::Result<Version>;

    /// Privileges `definition.role` currently holds on the objects the
    /// definition covers, keyed by object name (column name for column grants).
    ///
    /// Objects that exist but carry no privileges for the role are reported
    /// with empty sets.
    async fn granted_privileges(
        &self,
        definition: &GrantDefinition,
    ) -> anyhow::Result<BTreeMap<String, GrantedPrivileges>>;

    /// Run `statements` atomically.
    async fn apply(&self, statements: &[String]) -> anyhow::Result<()>;
}
