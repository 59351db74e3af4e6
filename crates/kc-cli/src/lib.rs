//! # kc-cli
//!
//! CLI tools for Keycloak user federation administration.
//!
//! This crate provides command-line utilities for:
//! - Converging a user federation and its mappers to a spec file
//! - Inspecting a user federation
//! - Managing the CLI configuration (`~/.keycloak/kc.toml`)
//!
//! [`commands::ApiClient`] implements [`kc_federation::ComponentApi`] on top
//! of the Keycloak admin REST API.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
