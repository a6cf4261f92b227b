//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{wildcard_match, RssSensorBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::load_blueprint;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sensor_id: String,
    map: String,
    parent_actor: Option<u32>,
    actor_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sensor_id: blueprint.sensor.id.clone(),
                    map: blueprint.world.map.clone(),
                    parent_actor: blueprint.sensor.parent_actor,
                    actor_count: blueprint.actors.len(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RssSensorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sensor.parent_actor.is_none() {
        warnings.push("sensor.parent_actor is not set - `run` will refuse to listen".to_string());
    }

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - responses are only summarized".to_string());
    }

    let filter = &blueprint.sensor.actor_filter;
    if !blueprint.actors.is_empty()
        && !blueprint
            .actors
            .iter()
            .any(|actor| wildcard_match(filter, &actor.type_id))
    {
        warnings.push(format!(
            "sensor.actor_filter '{}' matches none of the configured actors",
            filter
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK   Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sensor: {}", summary.sensor_id);
            println!("  Map: {}", summary.map);
            println!("  Parent actor: {:?}", summary.parent_actor);
            println!("  Actors: {}", summary.actor_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("FAIL Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
