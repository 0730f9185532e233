//! `outpost validate` — check a configuration file for errors.
//!
//! Parses and validates the config file, reporting results in either
//! human-readable text or machine-readable JSON. Beyond hard errors,
//! the report calls out targets whose `type` is unrecognized: they are
//! legal config, but the dispatch table builder will skip them, which
//! is usually a typo the operator wants to see before starting.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::OutpostError;

const KNOWN_TARGET_TYPES: &[&str] = &["http", "rabbitmq"];

pub fn execute(args: &ValidateArgs) -> Result<(), OutpostError> {
    let path = &args.config;

    if !path.exists() {
        return Err(OutpostError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    let warnings = skipped_target_warnings(&config);

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                println!("{}", report_json(&config, false, &errors, &warnings));
            }
        }
        return Err(OutpostError::ConfigValidation { errors });
    }

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
            for warning in &warnings {
                println!("  ! {warning}");
            }
        }
        ValidateFormat::Json => {
            println!("{}", report_json(&config, true, &[], &warnings));
        }
    }

    Ok(())
}

/// Targets the dispatch table builder would drop: legal to configure,
/// but worth flagging at validate time.
fn skipped_target_warnings(config: &Config) -> Vec<String> {
    let mut sources: Vec<_> = config.sources.iter().collect();
    sources.sort_by_key(|(name, _)| name.as_str());

    let mut warnings = Vec::new();
    for (source, source_cfg) in sources {
        for target in &source_cfg.targets {
            if !KNOWN_TARGET_TYPES.contains(&target.kind.to_lowercase().as_str()) {
                warnings.push(format!(
                    "sources.{source}.{}: unknown type '{}', target will be skipped",
                    target.name, target.kind
                ));
            }
        }
    }
    warnings
}

fn report_json(
    config: &Config,
    valid: bool,
    errors: &[crate::error::ValidationError],
    warnings: &[String],
) -> serde_json::Value {
    let json_errors: Vec<serde_json::Value> = errors
        .iter()
        .map(|e| {
            serde_json::json!({
                "scope": e.scope,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect();

    serde_json::json!({
        "valid": valid,
        "sources": config.sources.len(),
        "targets": config.total_targets(),
        "errors": json_errors,
        "warnings": warnings,
    })
}
