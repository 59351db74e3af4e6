//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// Keycloak CLI - user federation administration for Keycloak.
#[derive(Debug, Parser)]
#[command(name = "kc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Server URL (overrides config).
    #[arg(short, long, env = "KC_SERVER_URL")]
    pub server: Option<String>,

    /// Realm (overrides config and the realm given in a spec file).
    #[arg(short, long, env = "KC_REALM")]
    pub realm: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// User federation commands.
    #[command(subcommand)]
    Federation(FederationCommand),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// User federation commands.
#[derive(Debug, Subcommand)]
pub enum FederationCommand {
    /// Converge a user federation and its mappers to a spec file.
    Apply {
        /// Spec file (JSON, or TOML with a `.toml` extension).
        file: PathBuf,

        /// Report what would change without changing anything.
        #[arg(long)]
        dry_run: bool,

        /// Include before/after views in the output.
        #[arg(long)]
        diff: bool,
    },

    /// Show a user federation and its mappers.
    Get {
        /// Federation ID.
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        id: Option<String>,

        /// Federation name.
        #[arg(long)]
        name: Option<String>,
    },
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Initialize configuration interactively.
    Init,
}
