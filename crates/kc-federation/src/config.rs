//! Desired state of a user federation.
//!
//! [`FederationSpec`] is what a caller hands to the reconciler: the target
//! state, the realm, identity of the federation and the fields to converge.
//! Unset optional fields mean "not specified" and never cause a change.

use serde::{Deserialize, Serialize};

use crate::codec::{encode_config, ConfigValue, TypedConfig};
use crate::component::{Component, LDAP_MAPPER_PROVIDER_TYPE, USER_STORAGE_PROVIDER_TYPE};
use crate::error::{FederationError, FederationResult};

/// Default realm.
pub const DEFAULT_REALM: &str = "master";

/// Provider kinds that do not support mappers.
pub const MAPPERLESS_PROVIDERS: [&str; 2] = ["kerberos", "sssd"];

/// Target state of the federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// The federation is created or updated.
    #[default]
    Present,

    /// The federation is deleted if it exists.
    Absent,
}

/// How the write-only `bindCredential` takes part in change detection.
///
/// Keycloak always returns the bind credential redacted, so the existing
/// value never equals a desired plaintext value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindCredentialUpdateMode {
    /// Compare the credential like any other field. A run that sets it always
    /// detects a change and pushes it again.
    #[default]
    Always,

    /// Ignore the credential when deciding whether an update is needed, but
    /// send it along with any other change.
    OnlyIndirect,
}

/// Desired state of one mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperSpec {
    /// Mapper id; when absent the mapper is matched by name.
    #[serde(default)]
    pub id: Option<String>,

    /// Mapper name.
    #[serde(default)]
    pub name: Option<String>,

    /// Parent id; defaults to the federation id.
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<String>,

    /// Mapper implementation (e.g. `user-attribute-ldap-mapper`).
    #[serde(default, alias = "provider_id")]
    pub provider_id: Option<String>,

    /// Mapper component type.
    #[serde(default = "default_mapper_provider_type", alias = "provider_type")]
    pub provider_type: String,

    /// Mapper-specific configuration.
    #[serde(default)]
    pub config: Option<TypedConfig>,
}

impl MapperSpec {
    /// Creates a mapper spec matched by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a mapper spec matched by id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the mapper implementation.
    #[must_use]
    pub fn provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Adds a config value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config
            .get_or_insert_with(TypedConfig::new)
            .insert(key.into(), Some(value.into()));
        self
    }

    /// Returns the mapper as a wire component holding only specified fields.
    #[must_use]
    pub fn to_component(&self) -> Component {
        Component {
            id: self.id.clone(),
            name: self.name.clone(),
            provider_id: self.provider_id.clone(),
            provider_type: Some(self.provider_type.clone()),
            parent_id: self.parent_id.clone(),
            config: self.config.as_ref().map(encode_config),
            ..Component::default()
        }
    }
}

impl Default for MapperSpec {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            parent_id: None,
            provider_id: None,
            provider_type: default_mapper_provider_type(),
            config: None,
        }
    }
}

/// Desired state of a user federation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationSpec {
    /// Target state.
    #[serde(default)]
    pub state: State,

    /// Realm owning the federation.
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Federation id; when absent the federation is looked up by name.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Provider kind (`ldap`, `kerberos`, `sssd`, or a custom provider).
    #[serde(default, alias = "providerId")]
    pub provider_id: Option<String>,

    /// Component type.
    #[serde(default = "default_provider_type", alias = "providerType")]
    pub provider_type: String,

    /// Parent id; Keycloak uses the realm id when unset.
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,

    /// Delete existing mappers that are not listed in `mappers`.
    #[serde(default = "default_true")]
    pub remove_unspecified_mappers: bool,

    /// Change detection policy for `bindCredential`.
    #[serde(default)]
    pub bind_credential_update_mode: BindCredentialUpdateMode,

    /// Provider-specific configuration.
    #[serde(default)]
    pub config: Option<TypedConfig>,

    /// Mappers of the federation. `None` leaves existing mappers untouched.
    #[serde(default)]
    pub mappers: Option<Vec<MapperSpec>>,
}

fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

fn default_provider_type() -> String {
    USER_STORAGE_PROVIDER_TYPE.to_string()
}

fn default_mapper_provider_type() -> String {
    LDAP_MAPPER_PROVIDER_TYPE.to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for FederationSpec {
    fn default() -> Self {
        Self {
            state: State::default(),
            realm: default_realm(),
            id: None,
            name: None,
            provider_id: None,
            provider_type: default_provider_type(),
            parent_id: None,
            remove_unspecified_mappers: true,
            bind_credential_update_mode: BindCredentialUpdateMode::default(),
            config: None,
            mappers: None,
        }
    }
}

impl FederationSpec {
    /// Creates a new spec builder.
    #[must_use]
    pub fn builder() -> FederationSpecBuilder {
        FederationSpecBuilder::default()
    }

    /// Checks everything that can be checked without asking Keycloak.
    pub fn validate(&self) -> FederationResult<()> {
        if self.id.is_none() && self.name.is_none() {
            return Err(FederationError::validation(
                "either `id` or `name` has to be specified",
            ));
        }
        let Some(mappers) = &self.mappers else {
            return Ok(());
        };
        ensure_mappers_supported(self.provider_id.as_deref(), mappers.len())?;
        if mappers.iter().any(|m| m.id.is_none() && m.name.is_none()) {
            return Err(FederationError::validation(
                "either `name` or `id` has to be specified on each mapper",
            ));
        }
        Ok(())
    }

    /// Returns the federation as a wire component holding only specified fields.
    #[must_use]
    pub fn to_component(&self) -> Component {
        Component {
            id: self.id.clone(),
            name: self.name.clone(),
            provider_id: self.provider_id.clone(),
            provider_type: Some(self.provider_type.clone()),
            parent_id: self.parent_id.clone(),
            config: self.config.as_ref().map(encode_config),
            ..Component::default()
        }
    }

    /// Returns the desired mappers as wire components, if any were specified.
    #[must_use]
    pub fn mapper_components(&self) -> Option<Vec<Component>> {
        self.mappers
            .as_ref()
            .map(|mappers| mappers.iter().map(MapperSpec::to_component).collect())
    }
}

/// Fails when mappers are configured for a provider kind without mapper support.
pub fn ensure_mappers_supported(provider_id: Option<&str>, mapper_count: usize) -> FederationResult<()> {
    match provider_id {
        Some(provider) if mapper_count > 0 && MAPPERLESS_PROVIDERS.contains(&provider) => Err(
            FederationError::validation(format!("cannot configure mappers for {provider} provider")),
        ),
        _ => Ok(()),
    }
}

/// Builder for [`FederationSpec`].
#[derive(Debug, Default)]
pub struct FederationSpecBuilder {
    spec: FederationSpec,
}

impl FederationSpecBuilder {
    /// Sets the target state.
    #[must_use]
    pub fn state(mut self, state: State) -> Self {
        self.spec.state = state;
        self
    }

    /// Sets the realm.
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.spec.realm = realm.into();
        self
    }

    /// Sets the federation id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.spec.id = Some(id.into());
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.name = Some(name.into());
        self
    }

    /// Sets the provider kind.
    #[must_use]
    pub fn provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.spec.provider_id = Some(provider_id.into());
        self
    }

    /// Sets the parent id.
    #[must_use]
    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.spec.parent_id = Some(parent_id.into());
        self
    }

    /// Sets whether unlisted mappers are deleted.
    #[must_use]
    pub fn remove_unspecified_mappers(mut self, remove: bool) -> Self {
        self.spec.remove_unspecified_mappers = remove;
        self
    }

    /// Sets the bind credential policy.
    #[must_use]
    pub fn bind_credential_update_mode(mut self, mode: BindCredentialUpdateMode) -> Self {
        self.spec.bind_credential_update_mode = mode;
        self
    }

    /// Adds a config value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.spec
            .config
            .get_or_insert_with(TypedConfig::new)
            .insert(key.into(), Some(value.into()));
        self
    }

    /// Adds a mapper.
    #[must_use]
    pub fn mapper(mut self, mapper: MapperSpec) -> Self {
        self.spec.mappers.get_or_insert_with(Vec::new).push(mapper);
        self
    }

    /// Sets an explicit, possibly empty, mapper list.
    #[must_use]
    pub fn mappers(mut self, mappers: Vec<MapperSpec>) -> Self {
        self.spec.mappers = Some(mappers);
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> FederationSpec {
        self.spec
    }
}
