//! In-memory component store.
//!
//! Behaves like the Keycloak component endpoints closely enough to drive the
//! reconciler end to end, including the server behaviour the normalizer
//! compensates for:
//!
//! - `krbPrincipalAttribute` set to `""` is dropped on write
//! - `lastSync` is stamped on every write
//! - `bindCredential` is returned redacted, and a redacted value sent back
//!   keeps the stored secret
//! - creating an `ldap` federation provisions default mappers
//! - deleting a component deletes its children
//!
//! Every mutating call is journaled so tests can check what was sent.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::changeset::BIND_CREDENTIAL;
use crate::client::ComponentApi;
use crate::component::{Component, LDAP_MAPPER_PROVIDER_TYPE, USER_STORAGE_PROVIDER_TYPE};
use crate::error::{ComponentKind, FederationError, FederationResult};
use crate::normalize::{KRB_PRINCIPAL_ATTRIBUTE, LAST_SYNC};
use crate::report::SECRET_MASK;

/// Realm used by default.
pub const MASTER_REALM: &str = "master";

/// Kind of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// A journaled mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// What kind of call it was.
    pub kind: MutationKind,
    /// Id of the component concerned.
    pub id: String,
    /// Name of the component concerned, if known.
    pub name: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    components: BTreeMap<String, Stored>,
    insertion: u64,
    journal: Vec<Mutation>,
    ignored_keys: BTreeSet<String>,
    default_mappers: BTreeMap<String, Vec<Component>>,
    fail_next: Option<MutationKind>,
}

#[derive(Debug, Clone)]
struct Stored {
    realm: String,
    order: u64,
    component: Component,
}

/// In-memory implementation of [`ComponentApi`].
#[derive(Debug)]
pub struct InMemoryComponentApi {
    store: RwLock<Store>,
}

impl InMemoryComponentApi {
    /// Creates a store that provisions the usual LDAP default mappers.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Store::default();
        store
            .default_mappers
            .insert("ldap".to_string(), ldap_default_mappers());
        Self {
            store: RwLock::new(store),
        }
    }

    /// Creates a store that provisions no default mappers.
    #[must_use]
    pub fn without_default_mappers() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }

    /// Sets the default mappers provisioned for a provider.
    pub async fn set_default_mappers(&self, provider_id: &str, mappers: Vec<Component>) {
        self.store
            .write()
            .await
            .default_mappers
            .insert(provider_id.to_string(), mappers);
    }

    /// Makes the server silently ignore a config key on every write.
    pub async fn ignore_config_key(&self, key: &str) {
        self.store.write().await.ignored_keys.insert(key.to_string());
    }

    /// Makes the next call of the given kind fail.
    pub async fn fail_next(&self, kind: MutationKind) {
        self.store.write().await.fail_next = Some(kind);
    }

    /// Stores a component directly, without journaling or default mappers.
    ///
    /// Returns its id.
    pub async fn seed(&self, realm: &str, component: Component) -> String {
        let mut store = self.store.write().await;
        store.put(realm, component)
    }

    /// Returns all journaled mutations in call order.
    pub async fn journal(&self) -> Vec<Mutation> {
        self.store.read().await.journal.clone()
    }

    /// Forgets the journal.
    pub async fn clear_journal(&self) {
        self.store.write().await.journal.clear();
    }

    /// Returns a stored config value without redaction.
    pub async fn raw_config_value(&self, id: &str, key: &str) -> Option<String> {
        self.store
            .read()
            .await
            .components
            .get(id)
            .and_then(|stored| stored.component.config_value(key))
            .map(str::to_string)
    }

    /// Returns the number of stored components in a realm.
    pub async fn len(&self, realm: &str) -> usize {
        self.store
            .read()
            .await
            .components
            .values()
            .filter(|stored| stored.realm == realm)
            .count()
    }
}

impl Default for InMemoryComponentApi {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    fn put(&mut self, realm: &str, mut component: Component) -> String {
        let id = component
            .id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        component.id = Some(id.clone());
        if component.parent_id.is_none() {
            component.parent_id = Some(realm.to_string());
        }
        self.insertion += 1;
        self.components.insert(
            id.clone(),
            Stored {
                realm: realm.to_string(),
                order: self.insertion,
                component,
            },
        );
        id
    }

    fn check_failure(&mut self, kind: MutationKind) -> FederationResult<()> {
        if self.fail_next == Some(kind) {
            self.fail_next = None;
            return Err(FederationError::remote(format!(
                "API error: 500 - injected {kind:?} failure"
            )));
        }
        Ok(())
    }

    fn record(&mut self, kind: MutationKind, component: &Component) {
        self.journal.push(Mutation {
            kind,
            id: component.id.clone().unwrap_or_default(),
            name: component.name.clone(),
        });
    }

    /// Applies server-side write behaviour to an incoming component.
    fn accept(&self, mut component: Component, previous: Option<&Component>) -> Component {
        if let Some(config) = component.config.as_mut() {
            for key in &self.ignored_keys {
                config.remove(key);
                if let Some(old) = previous.and_then(|p| p.config.as_ref()).and_then(|c| c.get(key)) {
                    config.insert(key.clone(), old.clone());
                }
            }
            if config
                .get(KRB_PRINCIPAL_ATTRIBUTE)
                .is_some_and(|v| v.iter().all(String::is_empty))
            {
                config.remove(KRB_PRINCIPAL_ATTRIBUTE);
            }
            if config
                .get(BIND_CREDENTIAL)
                .is_some_and(|v| v.first().map(String::as_str) == Some(SECRET_MASK))
            {
                match previous.and_then(|p| p.config.as_ref()).and_then(|c| c.get(BIND_CREDENTIAL)) {
                    Some(secret) => config.insert(BIND_CREDENTIAL.to_string(), secret.clone()),
                    None => config.remove(BIND_CREDENTIAL),
                };
            }
        }
        component
    }

    fn visible(&self, realm: &str) -> Vec<&Stored> {
        let mut visible: Vec<&Stored> = self
            .components
            .values()
            .filter(|stored| stored.realm == realm)
            .collect();
        visible.sort_by_key(|stored| stored.order);
        visible
    }

    fn descendants(&self, id: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut queue = vec![id.to_string()];
        while let Some(parent) = queue.pop() {
            for (child_id, stored) in &self.components {
                if stored.component.parent_id.as_deref() == Some(parent.as_str())
                    && !found.contains(child_id)
                {
                    found.push(child_id.clone());
                    queue.push(child_id.clone());
                }
            }
        }
        found
    }
}

/// Returns a component the way the server renders it.
fn redacted(component: &Component) -> Component {
    let mut component = component.clone();
    if let Some(secret) = component
        .config
        .as_mut()
        .and_then(|config| config.get_mut(BIND_CREDENTIAL))
    {
        *secret = vec![SECRET_MASK.to_string()];
    }
    component
}

/// Only user storage providers are synced, so only they carry `lastSync`.
fn stamp_last_sync(component: &mut Component) {
    if component.provider_type.as_deref() != Some(USER_STORAGE_PROVIDER_TYPE) {
        return;
    }
    if let Some(config) = component.config.as_mut() {
        config.insert(LAST_SYNC.to_string(), vec![Utc::now().timestamp().to_string()]);
    }
}

fn ldap_default_mappers() -> Vec<Component> {
    [
        ("username", "username", "uid"),
        ("email", "email", "mail"),
        ("first name", "firstName", "cn"),
        ("last name", "lastName", "sn"),
    ]
    .into_iter()
    .map(|(name, model_attribute, ldap_attribute)| {
        Component::named(name)
            .with_provider_id("user-attribute-ldap-mapper")
            .with_provider_type(LDAP_MAPPER_PROVIDER_TYPE)
            .with_config("user.model.attribute", model_attribute)
            .with_config("ldap.attribute", ldap_attribute)
            .with_config("read.only", "true")
    })
    .collect()
}

impl ComponentApi for InMemoryComponentApi {
    async fn find_by_type_and_name(
        &self,
        realm: &str,
        provider_type: &str,
        name: &str,
    ) -> FederationResult<Vec<Component>> {
        let store = self.store.read().await;
        Ok(store
            .visible(realm)
            .into_iter()
            .filter(|stored| {
                stored.component.provider_type.as_deref() == Some(provider_type)
                    && stored.component.name.as_deref() == Some(name)
            })
            .map(|stored| redacted(&stored.component))
            .collect())
    }

    async fn get(&self, id: &str, realm: &str) -> FederationResult<Option<Component>> {
        let store = self.store.read().await;
        Ok(store
            .components
            .get(id)
            .filter(|stored| stored.realm == realm)
            .map(|stored| redacted(&stored.component)))
    }

    async fn create(&self, component: &Component, realm: &str) -> FederationResult<Component> {
        let mut store = self.store.write().await;
        store.check_failure(MutationKind::Create)?;

        let mut accepted = store.accept(component.clone(), None);
        stamp_last_sync(&mut accepted);
        let id = store.put(realm, accepted);

        let provisioned = component
            .provider_id
            .as_ref()
            .and_then(|provider| store.default_mappers.get(provider))
            .cloned()
            .unwrap_or_default();
        for mapper in provisioned {
            store.put(realm, mapper.with_parent_id(&id));
        }

        let created = store
            .components
            .get(&id)
            .map(|stored| stored.component.clone())
            .ok_or_else(|| FederationError::not_found(ComponentKind::Federation, &id))?;
        store.record(MutationKind::Create, &created);
        Ok(redacted(&created))
    }

    async fn update(&self, component: &Component, realm: &str) -> FederationResult<()> {
        let mut store = self.store.write().await;
        store.check_failure(MutationKind::Update)?;

        let id = component
            .id
            .clone()
            .ok_or_else(|| FederationError::remote("API error: 400 - component id is required"))?;
        let previous = store
            .components
            .get(&id)
            .filter(|stored| stored.realm == realm)
            .cloned()
            .ok_or_else(|| FederationError::remote(format!("API error: 404 - component {id} not found")))?;

        let mut accepted = store.accept(component.clone(), Some(&previous.component));
        if previous.component.config_value(LAST_SYNC).is_some() {
            stamp_last_sync(&mut accepted);
        }
        if accepted.parent_id.is_none() {
            accepted.parent_id.clone_from(&previous.component.parent_id);
        }
        store.record(MutationKind::Update, &accepted);
        store.components.insert(
            id,
            Stored {
                component: accepted,
                ..previous
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str, realm: &str) -> FederationResult<()> {
        let mut store = self.store.write().await;
        store.check_failure(MutationKind::Delete)?;

        let removed = store
            .components
            .get(id)
            .filter(|stored| stored.realm == realm)
            .map(|stored| stored.component.clone())
            .ok_or_else(|| FederationError::remote(format!("API error: 404 - component {id} not found")))?;
        for child in store.descendants(id) {
            store.components.remove(&child);
        }
        store.components.remove(id);
        store.record(MutationKind::Delete, &removed);
        Ok(())
    }

    async fn find_children(
        &self,
        parent_id: &str,
        realm: &str,
    ) -> FederationResult<Vec<Component>> {
        let store = self.store.read().await;
        Ok(store
            .visible(realm)
            .into_iter()
            .filter(|stored| stored.component.parent_id.as_deref() == Some(parent_id))
            .map(|stored| redacted(&stored.component))
            .collect())
    }
}
