//! Output formatting utilities.

use colored::Colorize;
use kc_federation::ReconcileOutcome;
use serde::Serialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One mapper in table output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct MapperRow {
    /// Mapper name.
    pub name: String,
    /// Mapper implementation.
    #[tabled(rename = "Provider")]
    pub provider_id: String,
    /// Mapper ID.
    #[tabled(rename = "ID")]
    pub id: String,
}

impl MapperRow {
    /// Builds rows from the `mappers` array of a sanitized federation.
    #[must_use]
    pub fn from_federation(federation: &Value) -> Vec<Self> {
        let text = |mapper: &Value, key: &str| {
            mapper
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        federation
            .get("mappers")
            .and_then(Value::as_array)
            .map(|mappers| {
                mappers
                    .iter()
                    .map(|mapper| Self {
                        name: text(mapper, "name"),
                        provider_id: text(mapper, "providerId"),
                        id: text(mapper, "id"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Outputs data in the specified format.
pub fn output<T: Tabled + Serialize>(data: &[T], format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No mappers.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            for item in data {
                let json = serde_json::to_value(item)?;
                print_yaml_value(&json, 0);
                println!();
            }
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Outputs a single item.
pub fn output_single<T: Serialize>(item: &T, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Yaml => {
            let json = serde_json::to_value(item)?;
            print_yaml_value(&json, 0);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item)?;
            println!("{json}");
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Outputs a sanitized federation, with its mappers as a table in table mode.
pub fn output_federation(federation: &Value, format: OutputFormat) -> crate::CliResult<()> {
    if format != OutputFormat::Table {
        return output_single(federation, format);
    }
    let mut summary = federation.clone();
    if let Value::Object(object) = &mut summary {
        object.remove("mappers");
    }
    print_yaml_value(&summary, 0);
    println!();
    output(&MapperRow::from_federation(federation), format)
}

/// Outputs the result of a reconciliation run.
pub fn output_outcome(outcome: &ReconcileOutcome, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if outcome.changed {
                success(&outcome.msg);
            } else {
                info(&outcome.msg);
            }
            if let Some(diff) = &outcome.diff {
                println!();
                println!("{}", "before:".bold());
                print_yaml_value(&diff.before, 1);
                println!("{}", "after:".bold());
                print_yaml_value(&diff.after, 1);
            }
            if outcome.end_state.get("mappers").is_some() {
                println!();
                output(&MapperRow::from_federation(&outcome.end_state), format)?;
            }
            Ok(())
        }
        OutputFormat::Quiet => {
            println!("{}", if outcome.changed { "changed" } else { "ok" });
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => output_single(outcome, format),
    }
}

/// Prints a JSON value as YAML-like output.
fn print_yaml_value(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Null => println!("{prefix}null"),
        Value::Bool(b) => println!("{prefix}{b}"),
        Value::Number(n) => println!("{prefix}{n}"),
        Value::String(s) if s.is_empty() => println!("{prefix}\"\""),
        Value::String(s) => println!("{prefix}{s}"),
        Value::Array(arr) => {
            for item in arr {
                if item.is_object() {
                    println!("{prefix}-");
                    print_yaml_value(item, indent + 1);
                } else {
                    print!("{prefix}- ");
                    print_yaml_value(item, 0);
                }
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                if val.is_object() || val.is_array() {
                    println!("{prefix}{key}:");
                    print_yaml_value(val, indent + 1);
                } else {
                    print!("{prefix}{key}: ");
                    print_yaml_value(val, 0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapper_rows_from_sanitized_federation() {
        let federation = json!({
            "name": "corp",
            "mappers": [
                { "id": "1", "name": "email", "providerId": "user-attribute-ldap-mapper" },
                { "name": "phone" }
            ]
        });

        let rows = MapperRow::from_federation(&federation);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].provider_id, "user-attribute-ldap-mapper");
        assert_eq!(rows[1].id, "");
    }

    #[test]
    fn no_mappers_key_means_no_rows() {
        assert!(MapperRow::from_federation(&json!({})).is_empty());
    }
}
