//! Strategy and copy presentation.

use super::shared::{format_section_heading, to_json};
use crate::error::PipelineError;
use crate::model::{AdCopy, AdCopyExport, Platform};
use crate::strategy::StrategyOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_strategies_text(outcome: &StrategyOutcome) -> String {
    let mut out = format!("{}\n", format_section_heading("Strategic angles"));
    for (i, prompt) in outcome.prompts.as_slice().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, prompt));
    }
    if outcome.used_fallback {
        out.push_str(&format!(
            "\n{} after {} attempts\n",
            "Default angles used".yellow(),
            outcome.attempts
        ));
    }
    out
}

pub fn format_strategies_json(outcome: &StrategyOutcome) -> Result<String, PipelineError> {
    to_json(&json!({
        "prompts": outcome.prompts,
        "attempts": outcome.attempts,
        "used_fallback": outcome.used_fallback,
    }))
}

pub fn format_copy_text(platform: &Platform, results: &[Result<AdCopy, PipelineError>]) -> String {
    let mut out = format!(
        "{}\n",
        format_section_heading(&format!("{} ad copy", platform))
    );
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Headline", "Body"]);
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(copy) => table.add_row(vec![
                (i + 1).to_string(),
                copy.headline.clone(),
                copy.body.clone(),
            ]),
            Err(err) => table.add_row(vec![
                (i + 1).to_string(),
                format!("{}", "failed".red()),
                err.to_string(),
            ]),
        };
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_copy_json(
    platform: &Platform,
    results: &[Result<AdCopy, PipelineError>],
) -> Result<String, PipelineError> {
    let variants: Vec<_> = results
        .iter()
        .map(|result| match result {
            Ok(copy) => json!({ "copy": copy }),
            Err(err) => json!({ "error": err.to_string() }),
        })
        .collect();
    to_json(&json!({ "platform": platform, "variants": variants }))
}

pub fn format_campaign_copy_text(export: &AdCopyExport) -> String {
    let mut out = String::new();
    for platform in Platform::core() {
        out.push_str(&format!("{}\n", format_section_heading(platform.as_str())));
        for (i, ad) in export.get(&platform).into_iter().flatten().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, ad));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_campaign_copy_json(export: &AdCopyExport) -> Result<String, PipelineError> {
    export.to_json_pretty()
}
