//! `ADCRAFT__SECTION__KEY` environment overrides,
//! e.g. `ADCRAFT__PIPELINE__MAX_CONCURRENT_SLOTS=4`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, Map};

pub const PREFIX: &str = "ADCRAFT";

/// Add the environment source. `vars` replaces the process environment when given.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<Map<String, String>>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let source = Environment::with_prefix(PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("pipeline.platforms")
        .source(vars);
    Ok(builder.add_source(source))
}
