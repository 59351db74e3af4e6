//! CLI error types.

use kc_federation::FederationError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// API error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Spec file could not be read.
    #[error("invalid spec file: {0}")]
    Spec(String),

    /// Reconciliation failed.
    #[error(transparent)]
    Federation(#[from] FederationError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

impl From<CliError> for FederationError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Federation(inner) => inner,
            other => Self::remote(other),
        }
    }
}
