//! CLI presentation: text and json formatters per command family.

mod config;
mod copy;
mod progress;
mod run;
mod shared;

pub use config::{format_config_json, format_config_paths, format_config_text, format_validation_result};
pub use copy::{
    format_campaign_copy_json, format_campaign_copy_text, format_copy_json, format_copy_text,
    format_strategies_json, format_strategies_text,
};
pub use progress::ProgressPrinter;
pub use run::{format_run_json, format_run_text};
pub use shared::{format_file_result, format_section_heading, format_visual_prompt};
