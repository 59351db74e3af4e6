//! User federation commands.

use std::path::Path;

use kc_federation::config::DEFAULT_REALM;
use kc_federation::{
    normalize, resolve, sanitize, ComponentKind, FederationError, FederationSpec, Reconciler,
    RunMode,
};

use crate::cli::FederationCommand;
use crate::config::OutputFormat;
use crate::output::{output_federation, output_outcome, warning};
use crate::CliConfig;

use super::ApiClient;

/// Runs a federation command.
pub async fn run_federation(
    cmd: FederationCommand,
    config: &CliConfig,
    server: Option<&str>,
    realm: Option<&str>,
    output_format: OutputFormat,
) -> crate::CliResult<()> {
    let client = ApiClient::new(config, server)?;

    match cmd {
        FederationCommand::Apply {
            file,
            dry_run,
            diff,
        } => {
            let mut spec = load_spec(&file)?;
            if let Some(realm) = realm {
                spec.realm = realm.to_string();
            }
            apply(&client, spec, RunMode { dry_run, diff }, output_format).await
        }
        FederationCommand::Get { id, name } => {
            let realm = config
                .effective_realm(realm)
                .unwrap_or_else(|| DEFAULT_REALM.to_string());
            get(&client, &realm, id.as_deref(), name.as_deref(), output_format).await
        }
    }
}

/// Reads a spec file; `.toml` files are parsed as TOML, anything else as JSON.
pub fn load_spec(path: &Path) -> crate::CliResult<FederationSpec> {
    let content = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    parse_spec(&content, is_toml)
}

/// Parses a spec document.
pub fn parse_spec(content: &str, is_toml: bool) -> crate::CliResult<FederationSpec> {
    if is_toml {
        toml::from_str(content).map_err(|e| crate::CliError::Spec(e.to_string()))
    } else {
        serde_json::from_str(content).map_err(|e| crate::CliError::Spec(e.to_string()))
    }
}

/// Reconciles a federation and prints the outcome.
async fn apply(
    client: &ApiClient,
    spec: FederationSpec,
    mode: RunMode,
    format: OutputFormat,
) -> crate::CliResult<()> {
    tracing::info!(realm = %spec.realm, server = client.base_url(), "applying user federation spec");
    if mode.dry_run && format == OutputFormat::Table {
        warning("Dry run: nothing will be changed.");
    }
    let outcome = Reconciler::new(client, spec, mode).run().await?;
    output_outcome(&outcome, format)
}

/// Prints a federation and its mappers.
async fn get(
    client: &ApiClient,
    realm: &str,
    id: Option<&str>,
    name: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let federation = resolve(client, realm, id, name).await?.ok_or_else(|| {
        FederationError::not_found(ComponentKind::Federation, id.or(name).unwrap_or_default())
    })?;
    let rendered = sanitize(Some(&normalize(federation)))?;
    output_federation(&rendered, format)
}
