//! Shared presentation: headings, JSON encoding and single-artifact results.

use crate::cli::parse::OutputFormat;
use crate::error::PipelineError;
use crate::visual;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use std::path::Path;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Internal(format!("Failed to encode JSON output: {}", e)))
}

/// A saved file, e.g. a generated image or composed creative.
pub fn format_file_result(
    label: &str,
    path: &Path,
    format: OutputFormat,
) -> Result<String, PipelineError> {
    match format {
        OutputFormat::Json => to_json(&json!({ "kind": label, "path": path })),
        OutputFormat::Text => Ok(format!("{} saved: {}", label, path.display())),
    }
}

pub fn format_visual_prompt(prompt: &str, format: OutputFormat) -> Result<String, PipelineError> {
    let words = visual::word_count(prompt);
    match format {
        OutputFormat::Json => to_json(&json!({ "visual_prompt": prompt, "words": words })),
        OutputFormat::Text => Ok(format!(
            "{}\n\n{}\n\n{} words",
            format_section_heading("Visual prompt"),
            prompt,
            words
        )),
    }
}
