//! Configuration presentation: effective config, validation, file locations.

use super::shared::to_json;
use crate::config::{AdcraftConfig, ValidationError};
use crate::error::PipelineError;
use owo_colors::OwoColorize;
use std::path::PathBuf;

fn masked(config: &AdcraftConfig) -> AdcraftConfig {
    let mut config = config.clone();
    if let Some(key) = config.backend.api_key.as_mut() {
        let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        *key = if key.chars().count() > 8 {
            format!("****{}", tail)
        } else {
            "****".to_string()
        };
    }
    config
}

pub fn format_config_text(config: &AdcraftConfig) -> Result<String, PipelineError> {
    toml::to_string_pretty(&masked(config))
        .map_err(|e| PipelineError::Internal(format!("Failed to encode configuration: {}", e)))
}

pub fn format_config_json(config: &AdcraftConfig) -> Result<String, PipelineError> {
    to_json(&masked(config))
}

pub fn format_validation_result(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => format!("{}", "Configuration is valid".green()),
        Err(errors) => {
            let mut out = format!(
                "{} ({}):",
                "Configuration has problems".red(),
                errors.len()
            );
            for error in errors {
                out.push_str(&format!("\n  - {}", error));
            }
            out
        }
    }
}

/// Files consulted in precedence order, marked by existence.
pub fn format_config_paths(paths: &[(String, Option<PathBuf>)]) -> String {
    let mut out = String::from("Configuration sources (lowest to highest precedence):\n");
    for (label, path) in paths {
        let line = match path {
            Some(path) if path.is_file() => format!("  {:<10} {} {}", label, path.display(), "(found)".green()),
            Some(path) => format!("  {:<10} {} {}", label, path.display(), "(absent)".dimmed()),
            None => format!("  {:<10} {}", label, "(unavailable)".dimmed()),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
