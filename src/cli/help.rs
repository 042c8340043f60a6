//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name for log fields (e.g. "generate", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Generate { .. } => "generate".to_string(),
        Commands::Strategies { .. } => "strategies".to_string(),
        Commands::Copy { .. } => "copy".to_string(),
        Commands::CampaignCopy { .. } => "campaign-copy".to_string(),
        Commands::Visual { .. } => "visual".to_string(),
        Commands::Image { .. } => "image".to_string(),
        Commands::Compose { .. } => "compose".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show { .. } => "show",
        ConfigCommands::Validate => "validate",
        ConfigCommands::Paths => "paths",
    }
}

/// Commands that call a generation backend.
pub fn needs_backend(command: &Commands) -> bool {
    !matches!(command, Commands::Config { .. })
}
