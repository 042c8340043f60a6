//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, needs_backend};
pub use output::{exit_code, map_error};
pub use parse::{BriefArgs, Cli, Commands, ConfigCommands, OutputFormat};
pub use presentation::{
    format_campaign_copy_json, format_campaign_copy_text, format_config_json,
    format_config_paths, format_config_text, format_copy_json, format_copy_text,
    format_file_result, format_run_json, format_run_text, format_section_heading,
    format_strategies_json, format_strategies_text, format_validation_result,
    format_visual_prompt, ProgressPrinter,
};
pub use route::RunContext;
