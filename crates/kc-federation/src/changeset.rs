//! Changeset between desired and existing federation state.

use std::collections::BTreeMap;

use crate::component::{merge_config, Component, Federation, FederationField, WireConfig};
use crate::config::{ensure_mappers_supported, BindCredentialUpdateMode, FederationSpec};
use crate::error::FederationResult;
use crate::mapper::merge_desired;

/// Config key of the bind credential, which Keycloak only ever returns redacted.
pub const BIND_CREDENTIAL: &str = "bindCredential";

/// New value of a changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A scalar field.
    Text(String),
    /// The full config after merging desired keys over existing ones.
    Config(WireConfig),
    /// The full desired mapper list.
    Mappers(Vec<Component>),
}

/// Fields whose desired value differs from the existing one.
///
/// When mappers are specified they are always present, as the complete merged
/// list rather than a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    changes: BTreeMap<FederationField, FieldValue>,
}

impl Changeset {
    /// Computes the changeset of `spec` against the normalized existing federation.
    pub fn build(spec: &FederationSpec, existing: Option<&Federation>) -> FederationResult<Self> {
        let desired = spec.to_component();
        let base = existing.map(|f| &f.component);
        let mut changes = BTreeMap::new();

        let scalars = [
            (FederationField::Id, &desired.id, base.and_then(|c| c.id.as_ref())),
            (FederationField::Name, &desired.name, base.and_then(|c| c.name.as_ref())),
            (
                FederationField::ProviderId,
                &desired.provider_id,
                base.and_then(|c| c.provider_id.as_ref()),
            ),
            (
                FederationField::ProviderType,
                &desired.provider_type,
                base.and_then(|c| c.provider_type.as_ref()),
            ),
            (
                FederationField::ParentId,
                &desired.parent_id,
                base.and_then(|c| c.parent_id.as_ref()),
            ),
        ];
        for (field, wanted, current) in scalars {
            if let Some(wanted) = wanted {
                if current != Some(wanted) {
                    tracing::debug!(field = field.param_name(), "field differs");
                    changes.insert(field, FieldValue::Text(wanted.clone()));
                }
            }
        }

        if let Some(wanted) = &desired.config {
            let current = base.and_then(|c| c.config.as_ref());
            let merged = merge_config(current, wanted);
            if current != Some(&merged) {
                tracing::debug!(field = "config", "field differs");
                changes.insert(FederationField::Config, FieldValue::Config(merged));
            }
        }

        if let Some(mappers) = spec.mapper_components() {
            let provider = spec
                .provider_id
                .as_deref()
                .or_else(|| base.and_then(|c| c.provider_id.as_deref()));
            ensure_mappers_supported(provider, mappers.len())?;

            let existing_mappers = existing.map_or(&[][..], |f| f.mappers.as_slice());
            let merged = merge_desired(&mappers, existing_mappers, spec.remove_unspecified_mappers)?;
            changes.insert(FederationField::Mappers, FieldValue::Mappers(merged));
        }

        Ok(Self { changes })
    }

    /// Returns true if nothing differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the new value of a field, if it changed.
    #[must_use]
    pub fn get(&self, field: FederationField) -> Option<&FieldValue> {
        self.changes.get(&field)
    }

    /// Iterates over changed fields in field order.
    pub fn iter(&self) -> impl Iterator<Item = (FederationField, &FieldValue)> {
        self.changes.iter().map(|(field, value)| (*field, value))
    }

    /// Returns the desired federation: the existing one with this changeset applied.
    #[must_use]
    pub fn apply(&self, existing: Option<&Federation>) -> Federation {
        let mut desired = existing.cloned().unwrap_or_default();
        for (field, value) in &self.changes {
            let component = &mut desired.component;
            match (field, value) {
                (FederationField::Id, FieldValue::Text(v)) => component.id = Some(v.clone()),
                (FederationField::Name, FieldValue::Text(v)) => component.name = Some(v.clone()),
                (FederationField::ProviderId, FieldValue::Text(v)) => {
                    component.provider_id = Some(v.clone());
                }
                (FederationField::ProviderType, FieldValue::Text(v)) => {
                    component.provider_type = Some(v.clone());
                }
                (FederationField::ParentId, FieldValue::Text(v)) => {
                    component.parent_id = Some(v.clone());
                }
                (FederationField::Config, FieldValue::Config(config)) => {
                    component.config = Some(config.clone());
                }
                (FederationField::Mappers, FieldValue::Mappers(mappers)) => {
                    desired.mappers.clone_from(mappers);
                }
                _ => {}
            }
        }
        desired
    }

    /// Renders the changeset as a wire-shaped object keyed by wire field names.
    pub fn to_wire(&self) -> FederationResult<serde_json::Value> {
        let mut object = serde_json::Map::new();
        for (field, value) in &self.changes {
            let value = match value {
                FieldValue::Text(v) => serde_json::Value::String(v.clone()),
                FieldValue::Config(config) => serde_json::to_value(config)?,
                FieldValue::Mappers(mappers) => serde_json::to_value(mappers)?,
            };
            object.insert(field.wire_name().to_string(), value);
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// Decides whether `desired` differs from `existing` under the credential policy.
///
/// With [`BindCredentialUpdateMode::OnlyIndirect`] the bind credential is
/// left out of the comparison; it still travels with the update payload.
#[must_use]
pub fn requires_update(
    desired: &Federation,
    existing: &Federation,
    mode: BindCredentialUpdateMode,
) -> bool {
    match mode {
        BindCredentialUpdateMode::Always => desired != existing,
        BindCredentialUpdateMode::OnlyIndirect => {
            without_bind_credential(desired) != without_bind_credential(existing)
        }
    }
}

fn without_bind_credential(federation: &Federation) -> Federation {
    let mut copy = federation.clone();
    if let Some(config) = copy.component.config.as_mut() {
        config.remove(BIND_CREDENTIAL);
    }
    copy
}
