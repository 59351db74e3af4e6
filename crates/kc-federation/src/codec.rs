//! Conversion between typed config values and the wire encoding.
//!
//! Keycloak expects every component config value as a list holding exactly
//! one string. Booleans are sent lowercase, numbers in their decimal form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::WireConfig;

/// A config value as written by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean flag, encoded as `"true"` / `"false"`.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Plain string, sent unchanged.
    Text(String),
}

impl ConfigValue {
    /// Returns the single string this value is sent as.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Caller-side config: `None` marks a key as not specified.
pub type TypedConfig = BTreeMap<String, Option<ConfigValue>>;

/// Encodes a typed config into wire form, dropping unspecified keys.
#[must_use]
pub fn encode_config(config: &TypedConfig) -> WireConfig {
    config
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|value| (key.clone(), vec![value.encode()]))
        })
        .collect()
}

/// Strips the single-element wrapper of every wire value for display.
///
/// An empty list decodes to `null`.
#[must_use]
pub fn decode_config(config: &WireConfig) -> serde_json::Map<String, serde_json::Value> {
    config
        .iter()
        .map(|(key, values)| {
            let value = values
                .first()
                .map_or(serde_json::Value::Null, |v| serde_json::Value::String(v.clone()));
            (key.clone(), value)
        })
        .collect()
}
