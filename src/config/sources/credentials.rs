//! Credential variables read under their conventional names.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// API key variables, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const PROJECT_ID_VAR: &str = "GCP_PROJECT_ID";
pub const LOCATION_VAR: &str = "GCP_LOCATION";

/// Override backend credentials with whatever `lookup` finds; blank values
/// count as absent.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let api_key = API_KEY_VARS.iter().find_map(|name| present(name));
    builder
        .set_override_option("backend.api_key", api_key)?
        .set_override_option("backend.project_id", present(PROJECT_ID_VAR))?
        .set_override_option("backend.location", present(LOCATION_VAR))
}
