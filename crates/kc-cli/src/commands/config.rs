//! Configuration management commands.

use std::io::Write;

use crate::cli::ConfigCommand;
use crate::config::{AuthConfig, OutputFormat};
use crate::output::{info, success};
use crate::CliConfig;

/// Keys accepted by `kc config set`.
const KNOWN_KEYS: &str = "server_url, default_realm, output_format, access_token";

/// Runs a config command.
pub fn run_config(cmd: ConfigCommand, config: &mut CliConfig) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Set { key, value } => {
            apply_setting(config, &key, &value)?;
            config.save()?;
            let shown = if is_token_key(&key) { "****" } else { value.as_str() };
            success(&format!("Set {key} = {shown}"));
            Ok(())
        }
        ConfigCommand::Init => init_config(config),
    }
}

/// Shows the current configuration.
fn show_config(config: &CliConfig) -> crate::CliResult<()> {
    let config_path = CliConfig::config_path()?;

    info(&format!("Configuration file: {}", config_path.display()));
    println!();
    println!("server_url: {}", config.server_url);

    if let Some(realm) = &config.default_realm {
        println!("default_realm: {realm}");
    }

    println!("output_format: {:?}", config.output_format);

    if config.access_token().is_some() {
        println!("access_token: ****");
    }

    Ok(())
}

fn is_token_key(key: &str) -> bool {
    matches!(key, "access_token" | "token")
}

/// Changes one configuration value in memory.
fn apply_setting(config: &mut CliConfig, key: &str, value: &str) -> crate::CliResult<()> {
    let cleared = value.is_empty() || value == "none";
    match key {
        "server_url" | "server" => {
            config.server_url = value.to_string();
        }
        "default_realm" | "realm" => {
            config.default_realm = (!cleared).then(|| value.to_string());
        }
        "output_format" | "output" => {
            config.output_format = value.parse::<OutputFormat>()?;
        }
        key if is_token_key(key) => {
            config.auth = (!cleared).then(|| AuthConfig {
                access_token: Some(value.to_string()),
            });
        }
        _ => {
            return Err(crate::CliError::InvalidArgument(format!(
                "Unknown configuration key: {key}. Known keys: {KNOWN_KEYS}"
            )));
        }
    }
    Ok(())
}

/// Reads one line from stdin after printing a prompt.
fn prompt(label: &str) -> crate::CliResult<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Initializes configuration interactively.
fn init_config(config: &mut CliConfig) -> crate::CliResult<()> {
    let config_path = CliConfig::config_path()?;

    info("Initializing Keycloak CLI configuration...");
    println!();

    let server = prompt(&format!("Server URL [{}]: ", config.server_url))?;
    if !server.is_empty() {
        config.server_url = server;
    }

    let current_realm = config.default_realm.as_deref().unwrap_or("(none)");
    let realm = prompt(&format!("Default realm [{current_realm}]: "))?;
    if !realm.is_empty() && realm != "(none)" {
        config.default_realm = Some(realm);
    }

    let format = prompt(&format!(
        "Output format (table/json/yaml/quiet) [{:?}]: ",
        config.output_format
    ))?;
    if let Ok(format) = format.parse::<OutputFormat>() {
        config.output_format = format;
    }

    let token = prompt("Access token (leave empty to keep): ")?;
    if !token.is_empty() {
        apply_setting(config, "access_token", &token)?;
    }

    config.save()?;

    println!();
    success(&format!("Configuration saved to: {}", config_path.display()));
    Ok(())
}
