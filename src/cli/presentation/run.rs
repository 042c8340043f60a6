//! Pipeline run presentation.

use super::shared::{format_section_heading, to_json};
use crate::error::PipelineError;
use crate::model::PipelineState;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn format_run_json(state: &PipelineState) -> Result<String, PipelineError> {
    to_json(state)
}

pub fn format_run_text(state: &PipelineState) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Creative run")));
    out.push_str(&format!("  Run: {}\n", state.run_id));
    out.push_str(&format!("  Product: {}\n", state.brief.product_description()));
    out.push_str(&format!("  Audience: {}\n\n", state.brief.target_audience()));

    if let Some(prompts) = &state.strategic_prompts {
        out.push_str(&format!("{}\n", format_section_heading("Strategic angles")));
        for (i, prompt) in prompts.as_slice().iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, prompt));
        }
        out.push('\n');
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Slot", "Headline", "Image", "Creative", "Status"]);
    for (k, slot) in state.slots.iter().enumerate() {
        let headline = state
            .generated_text
            .get(k)
            .and_then(Option::as_ref)
            .map(|copy| copy.headline.clone())
            .unwrap_or_else(|| "-".to_string());
        let image = state
            .generated_images
            .get(k)
            .and_then(Option::as_ref)
            .map(|image| file_name(&image.image_path))
            .unwrap_or_else(|| "-".to_string());
        let creative = state
            .composed_ads
            .get(k)
            .and_then(Option::as_ref)
            .map(|creative| file_name(&creative.composed_image_path))
            .unwrap_or_else(|| "-".to_string());
        let status = match state.failures.iter().find(|f| &f.slot == slot) {
            Some(failure) => format!("{}", format!("failed: {}", failure.stage).red()),
            None => format!("{}", "ok".green()),
        };
        table.add_row(vec![slot.to_string(), headline, image, creative, status]);
    }
    out.push_str(&format!("{}\n\n", table));

    if let Some(recommendation) = &state.final_recommendation {
        out.push_str(&format!("{}\n", format_section_heading("Recommendation")));
        out.push_str(recommendation);
        out.push('\n');
    }
    out
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
