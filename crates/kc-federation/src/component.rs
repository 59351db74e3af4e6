//! Wire model of Keycloak components.
//!
//! Both user federations and their mappers are stored by Keycloak as generic
//! components: `{id, name, providerId, providerType, parentId, config}` where
//! every config value is wrapped in a list of strings.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Component configuration in wire form: key to a single-element list of strings.
pub type WireConfig = BTreeMap<String, Vec<String>>;

/// Component type of user federations.
pub const USER_STORAGE_PROVIDER_TYPE: &str = "org.keycloak.storage.UserStorageProvider";

/// Component type of LDAP federation mappers.
pub const LDAP_MAPPER_PROVIDER_TYPE: &str = "org.keycloak.storage.ldap.mappers.LDAPStorageMapper";

// ============================================================================
// Component
// ============================================================================

/// A Keycloak component as exchanged with the admin API.
///
/// Every field is optional: a component read from the server carries all of
/// them, while a desired component only carries what the caller specified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Identifier assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Provider implementation (e.g. `ldap`, `user-attribute-ldap-mapper`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Component type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Owning component or realm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Provider-specific configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<WireConfig>,

    /// Fields this crate does not interpret (e.g. `subType`), kept for round trips.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Component {
    /// Creates a component with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the provider id.
    #[must_use]
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Sets the provider type.
    #[must_use]
    pub fn with_provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    /// Sets the parent id.
    #[must_use]
    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Adds a config entry in wire form.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .get_or_insert_with(WireConfig::new)
            .insert(key.into(), vec![value.into()]);
        self
    }

    /// Returns the first value of a config entry.
    #[must_use]
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|config| config.get(key))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the name, treating a missing name as empty.
    #[must_use]
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Overlays the explicitly specified fields of `patch` onto this component.
    ///
    /// Scalar fields of the patch win when present. Config is merged per key,
    /// so keys the patch does not mention keep their current value. Unknown
    /// fields are carried over from `self`.
    #[must_use]
    pub fn merged_with(&self, patch: &Self) -> Self {
        let mut merged = self.clone();
        overlay(&mut merged.id, &patch.id);
        overlay(&mut merged.name, &patch.name);
        overlay(&mut merged.provider_id, &patch.provider_id);
        overlay(&mut merged.provider_type, &patch.provider_type);
        overlay(&mut merged.parent_id, &patch.parent_id);
        if let Some(config) = &patch.config {
            merged.config = Some(merge_config(self.config.as_ref(), config));
        }
        merged
    }
}

fn overlay(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

/// Merges `patch` over `base` per key.
#[must_use]
pub fn merge_config(base: Option<&WireConfig>, patch: &WireConfig) -> WireConfig {
    let mut merged = base.cloned().unwrap_or_default();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Orders components by name, a missing name sorting first.
#[must_use]
pub fn by_name(a: &Component, b: &Component) -> Ordering {
    a.name_or_empty().cmp(b.name_or_empty())
}

/// Sorts components by name (stable, missing names first).
pub fn sort_by_name(components: &mut [Component]) {
    components.sort_by(by_name);
}

// ============================================================================
// Federation
// ============================================================================

/// A user federation together with its mappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Federation {
    /// The federation component itself.
    #[serde(flatten)]
    pub component: Component,

    /// Mapper components whose parent is this federation, sorted by name.
    #[serde(default)]
    pub mappers: Vec<Component>,
}

impl Federation {
    /// Creates a federation from its component and mappers.
    #[must_use]
    pub fn new(component: Component, mut mappers: Vec<Component>) -> Self {
        sort_by_name(&mut mappers);
        Self { component, mappers }
    }

    /// Returns the federation id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.component.id.as_deref()
    }
}

// ============================================================================
// Field Table
// ============================================================================

/// Federation-level fields, in changeset order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FederationField {
    /// `id`
    Id,
    /// `name`
    Name,
    /// `providerId`
    ProviderId,
    /// `providerType`
    ProviderType,
    /// `parentId`
    ParentId,
    /// `config`
    Config,
    /// `mappers`
    Mappers,
}

/// Wire name and caller parameter name of every federation field.
const FIELD_TABLE: [(FederationField, &str, &str); 7] = [
    (FederationField::Id, "id", "id"),
    (FederationField::Name, "name", "name"),
    (FederationField::ProviderId, "providerId", "provider_id"),
    (FederationField::ProviderType, "providerType", "provider_type"),
    (FederationField::ParentId, "parentId", "parent_id"),
    (FederationField::Config, "config", "config"),
    (FederationField::Mappers, "mappers", "mappers"),
];

impl FederationField {
    /// All fields in changeset order.
    pub const ALL: [Self; 7] = [
        Self::Id,
        Self::Name,
        Self::ProviderId,
        Self::ProviderType,
        Self::ParentId,
        Self::Config,
        Self::Mappers,
    ];

    /// Returns the camelCase name used on the wire.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        FIELD_TABLE[self as usize].1
    }

    /// Returns the snake_case name used by callers.
    #[must_use]
    pub const fn param_name(self) -> &'static str {
        FIELD_TABLE[self as usize].2
    }

    /// Looks up a field by its wire name.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        FIELD_TABLE
            .iter()
            .find(|(_, wire, _)| *wire == name)
            .map(|(field, _, _)| *field)
    }
}
