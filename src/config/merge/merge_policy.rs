//! Merge rules: defaults, override order, conflict handling.

use crate::{composer, copywriter, image, strategy};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables merge, scalars
/// and lists replace.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("pipeline.platforms", vec!["Facebook", "Google", "TikTok"])?
        .set_default("pipeline.variations_per_platform", copywriter::DEFAULT_VARIATIONS as u64)?
        .set_default("pipeline.goal", "Awareness")?
        .set_default("pipeline.compose", true)?
        .set_default("pipeline.max_concurrent_slots", 1_u64)?
        .set_default("pipeline.strategy_attempts", strategy::DEFAULT_MAX_ATTEMPTS as u64)?
        .set_default("pipeline.copy_attempts", copywriter::DEFAULT_MAX_ATTEMPTS as u64)?
        .set_default("output.images_dir", image::DEFAULT_IMAGES_DIR)?
        .set_default("output.ads_dir", composer::DEFAULT_ADS_DIR)
}
