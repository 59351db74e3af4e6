//! Federation reconciliation error types.
//!
//! Every variant is fatal for the current run. Ambiguity and validation
//! errors are raised before the first mutating call of their code path;
//! remote errors are handed through from the admin API client unchanged.

use std::fmt;

use thiserror::Error;

/// Kind of component an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A user federation.
    Federation,
    /// A federation mapper.
    Mapper,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Federation => f.write_str("user federation"),
            Self::Mapper => f.write_str("mapper"),
        }
    }
}

/// Errors that can occur while reconciling a user federation.
#[derive(Debug, Error)]
pub enum FederationError {
    /// A name lookup matched more than one component.
    #[error("found multiple {kind}s with name `{name}`, cannot continue; specify an id instead")]
    Ambiguous {
        /// What was looked up.
        kind: ComponentKind,
        /// The duplicated name.
        name: String,
    },

    /// The desired state is invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// A component that has to exist could not be found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up.
        kind: ComponentKind,
        /// The identifier that no longer resolves.
        id: String,
    },

    /// The admin API client reported a failure.
    #[error("remote service error: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A component could not be rendered for output.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FederationError {
    /// Creates an ambiguity error.
    #[must_use]
    pub fn ambiguous(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::Ambiguous {
            kind,
            name: name.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(kind: ComponentKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wraps an error reported by the admin API client.
    #[must_use]
    pub fn remote(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Remote(err.into())
    }

    /// Checks if this is an ambiguity error.
    #[must_use]
    pub const fn is_ambiguity(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Checks if this error came from the remote service.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::NotFound { .. })
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(FederationError::ambiguous(ComponentKind::Mapper, "email").is_ambiguity());
        assert!(FederationError::validation("no name").is_validation());
        assert!(FederationError::remote("401 Unauthorized").is_remote());
        assert!(FederationError::not_found(ComponentKind::Federation, "abc").is_remote());
    }

    #[test]
    fn ambiguity_message_names_the_duplicate() {
        let err = FederationError::ambiguous(ComponentKind::Federation, "dup");
        assert_eq!(
            err.to_string(),
            "found multiple user federations with name `dup`, cannot continue; specify an id instead"
        );
    }

    #[test]
    fn remote_message_is_preserved() {
        let err = FederationError::remote("API error: 409 - conflict");
        assert_eq!(err.to_string(), "remote service error: API error: 409 - conflict");
    }
}
