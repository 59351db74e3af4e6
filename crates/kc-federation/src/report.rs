//! Sanitized rendering of reconciliation results.
//!
//! Everything reported back to the caller goes through [`sanitize`]: config
//! values are unwrapped from their single-element lists and the bind
//! credential is masked.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::changeset::{Changeset, BIND_CREDENTIAL};
use crate::codec::decode_config;
use crate::component::{Component, Federation, FederationField};
use crate::error::FederationResult;

/// Placeholder shown instead of the bind credential.
pub const SECRET_MASK: &str = "**********";

/// Before and after views of a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    /// State before the run; an empty string when the federation did not exist.
    pub before: Value,
    /// State after the run; an empty string when the federation is gone.
    pub after: Value,
}

impl Diff {
    /// Creates a diff from optional sides, rendering a missing side as `""`.
    #[must_use]
    pub fn new(before: Option<Value>, after: Option<Value>) -> Self {
        let blank = || Value::String(String::new());
        Self {
            before: before.unwrap_or_else(blank),
            after: after.unwrap_or_else(blank),
        }
    }
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Whether the run changed (or, in dry-run mode, would change) anything.
    pub changed: bool,
    /// Human-readable summary.
    pub msg: String,
    /// Before/after views, only when diff mode is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    /// Sanitized changeset.
    pub proposed: Value,
    /// Sanitized federation as found before the run.
    pub existing: Value,
    /// Sanitized federation as it is (or would be) after the run.
    pub end_state: Value,
}

impl ReconcileOutcome {
    /// Creates an unchanged outcome with the given proposed and existing views.
    #[must_use]
    pub fn new(proposed: Value, existing: Value) -> Self {
        Self {
            changed: false,
            msg: String::new(),
            diff: None,
            proposed,
            existing,
            end_state: empty_object(),
        }
    }
}

/// Returns `{}`.
#[must_use]
pub fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Renders a federation for output; a missing federation renders as `{}`.
pub fn sanitize(federation: Option<&Federation>) -> FederationResult<Value> {
    let Some(federation) = federation else {
        return Ok(empty_object());
    };
    let mut value = serde_json::to_value(&federation.component)?;
    unwrap_config(&mut value, &federation.component, true);

    let mut mappers = Vec::with_capacity(federation.mappers.len());
    for mapper in &federation.mappers {
        let mut rendered = serde_json::to_value(mapper)?;
        unwrap_config(&mut rendered, mapper, false);
        mappers.push(rendered);
    }
    if let Value::Object(object) = &mut value {
        object.insert("mappers".to_string(), Value::Array(mappers));
    }
    Ok(value)
}

/// Renders a changeset for output.
pub fn sanitize_changeset(changeset: &Changeset) -> FederationResult<Value> {
    let mut value = changeset.to_wire()?;
    let Value::Object(object) = &mut value else {
        return Ok(value);
    };
    for (key, entry) in object.iter_mut() {
        match FederationField::from_wire_name(key) {
            Some(FederationField::Config) => *entry = display_config(entry.take(), true),
            Some(FederationField::Mappers) => {
                let Value::Array(mappers) = entry else { continue };
                for mapper in mappers {
                    if let Some(config) = mapper.get_mut("config") {
                        *config = display_config(config.take(), false);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(value)
}

fn unwrap_config(rendered: &mut Value, component: &Component, mask: bool) {
    let (Some(config), Value::Object(object)) = (&component.config, rendered) else {
        return;
    };
    let mut decoded = decode_config(config);
    if mask {
        mask_secret(&mut decoded);
    }
    object.insert("config".to_string(), Value::Object(decoded));
}

fn display_config(config: Value, mask: bool) -> Value {
    let Value::Object(entries) = config else {
        return config;
    };
    let mut decoded: serde_json::Map<String, Value> = entries
        .into_iter()
        .map(|(key, values)| {
            let first = match values {
                Value::Array(mut list) if !list.is_empty() => list.swap_remove(0),
                Value::Array(_) => Value::Null,
                other => other,
            };
            (key, first)
        })
        .collect();
    if mask {
        mask_secret(&mut decoded);
    }
    Value::Object(decoded)
}

fn mask_secret(config: &mut serde_json::Map<String, Value>) {
    if let Some(secret) = config.get_mut(BIND_CREDENTIAL) {
        *secret = Value::String(SECRET_MASK.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FederationSpec, MapperSpec};
    use serde_json::json;

    fn federation() -> Federation {
        Federation::new(
            Component::named("corp")
                .with_id("fed")
                .with_config("enabled", "true")
                .with_config(BIND_CREDENTIAL, "plaintext"),
            vec![Component::named("email")
                .with_id("m1")
                .with_config("ldap.attribute", "mail")
                .with_config(BIND_CREDENTIAL, "not-a-secret-here")],
        )
    }

    #[test]
    fn sanitize_unwraps_and_masks() {
        let value = sanitize(Some(&federation())).unwrap();

        assert_eq!(value["config"]["enabled"], json!("true"));
        assert_eq!(value["config"][BIND_CREDENTIAL], json!(SECRET_MASK));
        assert_eq!(value["mappers"][0]["config"]["ldap.attribute"], json!("mail"));
        assert_eq!(
            value["mappers"][0]["config"][BIND_CREDENTIAL],
            json!("not-a-secret-here")
        );
    }

    #[test]
    fn sanitize_absent_is_empty_object() {
        assert_eq!(sanitize(None).unwrap(), json!({}));
    }

    #[test]
    fn sanitize_always_lists_mappers() {
        let value = sanitize(Some(&Federation::default())).unwrap();
        assert_eq!(value, json!({ "mappers": [] }));
    }

    #[test]
    fn changeset_is_masked() {
        let spec = FederationSpec::builder()
            .name("corp")
            .config(BIND_CREDENTIAL, "plaintext")
            .mapper(MapperSpec::named("email").config("ldap.attribute", "mail"))
            .build();
        let changeset = Changeset::build(&spec, None).unwrap();

        let value = sanitize_changeset(&changeset).unwrap();

        assert_eq!(value["name"], json!("corp"));
        assert_eq!(value["config"][BIND_CREDENTIAL], json!(SECRET_MASK));
        assert_eq!(value["mappers"][0]["config"]["ldap.attribute"], json!("mail"));
    }

    #[test]
    fn diff_renders_missing_side_as_blank() {
        let diff = Diff::new(None, Some(json!({})));
        assert_eq!(diff.before, json!(""));
        assert_eq!(diff.after, json!({}));
    }
}
