//! Normalization of federations read back from Keycloak.
//!
//! Keycloak does not echo a federation exactly as it was sent. Each rule
//! below undoes one such asymmetry so that desired and existing state can be
//! compared with plain equality. Rules only touch the federation's own
//! config, never its mappers.

use crate::component::{Component, Federation};

/// Config key holding the Kerberos principal attribute.
pub const KRB_PRINCIPAL_ATTRIBUTE: &str = "krbPrincipalAttribute";

/// Config key holding the timestamp of the last periodic sync.
pub const LAST_SYNC: &str = "lastSync";

/// A single normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationRule {
    /// Keycloak deletes `krbPrincipalAttribute` when it is set to `""`, so a
    /// missing key is restored as an explicit empty value.
    RestoreEmptyKrbPrincipalAttribute,

    /// Keycloak stamps `lastSync` on its own schedule; the key is removed so
    /// it never shows up as a change.
    DropLastSync,
}

impl NormalizationRule {
    /// All rules, in the order they are applied.
    pub const ALL: [Self; 2] = [Self::RestoreEmptyKrbPrincipalAttribute, Self::DropLastSync];

    /// Returns the config key this rule is about.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RestoreEmptyKrbPrincipalAttribute => KRB_PRINCIPAL_ATTRIBUTE,
            Self::DropLastSync => LAST_SYNC,
        }
    }

    /// Applies the rule to a component. Components without config are left alone.
    pub fn apply(self, component: &mut Component) {
        let Some(config) = component.config.as_mut() else {
            return;
        };
        match self {
            Self::RestoreEmptyKrbPrincipalAttribute => {
                config
                    .entry(self.key().to_string())
                    .or_insert_with(|| vec![String::new()]);
            }
            Self::DropLastSync => {
                config.remove(self.key());
            }
        }
    }
}

/// Applies every rule to a federation component.
#[must_use]
pub fn normalize_component(mut component: Component) -> Component {
    for rule in NormalizationRule::ALL {
        rule.apply(&mut component);
    }
    component
}

/// Normalizes a federation read from Keycloak.
#[must_use]
pub fn normalize(federation: Federation) -> Federation {
    Federation {
        component: normalize_component(federation.component),
        mappers: federation.mappers,
    }
}
