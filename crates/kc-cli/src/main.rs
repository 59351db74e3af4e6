//! # Keycloak CLI
//!
//! Command-line tools for Keycloak user federation administration.

#![forbid(unsafe_code)]

use clap::Parser;
use kc_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_federation},
    config::CliConfig,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "warn,kc_federation=debug,kc_cli=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match CliConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Federation(cmd) => {
            run_federation(
                cmd,
                &config,
                cli.server.as_deref(),
                cli.realm.as_deref(),
                cli.output,
            )
            .await
        }
        Command::Config(cmd) => run_config(cmd, &mut config),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
