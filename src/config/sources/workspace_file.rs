//! Workspace config files: `config/config.toml`, then `config/{profile}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "development";

/// Workspace files in the order they are layered. Later files win.
pub fn workspace_config_files(workspace_root: &Path, profile: &str) -> [PathBuf; 2] {
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", profile)),
    ]
}

/// Layer the workspace files that exist onto `builder`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
    profile: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_config_files(workspace_root, profile)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
