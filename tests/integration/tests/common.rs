//! Common test utilities and fixtures.

use kc_federation::config::FederationSpecBuilder;
use kc_federation::memory::MASTER_REALM;
use kc_federation::{
    normalize, resolve, Federation, FederationSpec, InMemoryComponentApi, MapperSpec,
    ReconcileOutcome, Reconciler, RunMode,
};

/// Test environment around an in-memory Keycloak.
pub struct TestEnv {
    /// The admin API the reconciler talks to.
    pub api: InMemoryComponentApi,
}

impl TestEnv {
    /// Creates an environment whose server provisions default LDAP mappers.
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kc_federation=debug")
            .with_test_writer()
            .try_init();

        Self {
            api: InMemoryComponentApi::new(),
        }
    }

    /// Reconciles a spec, mutating the server.
    pub async fn apply(&self, spec: FederationSpec) -> anyhow::Result<ReconcileOutcome> {
        self.run(spec, RunMode::apply()).await
    }

    /// Reconciles a spec in the given mode.
    pub async fn run(&self, spec: FederationSpec, mode: RunMode) -> anyhow::Result<ReconcileOutcome> {
        Ok(Reconciler::new(&self.api, spec, mode).run().await?)
    }

    /// Reads the normalized federation with the given name from the master realm.
    pub async fn current(&self, name: &str) -> anyhow::Result<Option<Federation>> {
        Ok(resolve(&self.api, MASTER_REALM, None, Some(name))
            .await?
            .map(normalize))
    }

    /// Names of the mappers of a federation, in order.
    pub async fn mapper_names(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let federation = self
            .current(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("federation {name} does not exist"))?;
        Ok(federation
            .mappers
            .iter()
            .map(|mapper| mapper.name_or_empty().to_string())
            .collect())
    }

    /// Number of mutating calls the server received so far.
    pub async fn mutations(&self) -> usize {
        self.api.journal().await.len()
    }
}

/// An LDAP federation named `corp`.
pub fn corp() -> FederationSpecBuilder {
    FederationSpec::builder()
        .name("corp")
        .provider_id("ldap")
        .config("enabled", true)
        .config("vendor", "ad")
        .config("connectionUrl", "ldaps://ldap.example.com")
        .config("usersDn", "ou=people,dc=example,dc=com")
}

/// A department mapper that no default mapper provides.
pub fn department() -> MapperSpec {
    MapperSpec::named("department")
        .provider_id("user-attribute-ldap-mapper")
        .config("ldap.attribute", "department")
        .config("user.model.attribute", "department")
        .config("read.only", true)
}
