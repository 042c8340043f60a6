//! Layered configuration feeding pipeline runs

use super::test_utils::{brief, offline};
use adcraft::config::{AdcraftConfig, ConfigLoader};
use adcraft::model::{CampaignGoal, Platform};
use adcraft::pipeline::PipelineOrchestrator;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

fn loader(root: &Path, vars: &[(&str, &str)]) -> ConfigLoader {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new(root).with_global_file(None).with_env(env)
}

#[test]
fn test_precedence_workspace_then_explicit_then_env() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
[pipeline]
variations_per_platform = 4
max_concurrent_slots = 2
goal = "Consideration"
"#,
    )
    .unwrap();
    let explicit = temp_dir.path().join("override.toml");
    std::fs::write(
        &explicit,
        r#"
[pipeline]
variations_per_platform = 5
max_concurrent_slots = 3
"#,
    )
    .unwrap();

    let config = loader(
        temp_dir.path(),
        &[("ADCRAFT__PIPELINE__MAX_CONCURRENT_SLOTS", "8")],
    )
    .with_file(&explicit)
    .load()
    .unwrap();

    assert_eq!(config.pipeline.goal, CampaignGoal::Consideration);
    assert_eq!(config.pipeline.variations_per_platform, 5);
    assert_eq!(config.pipeline.max_concurrent_slots, 8);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_are_reported_together() {
    let temp_dir = TempDir::new().unwrap();
    let config = loader(
        temp_dir.path(),
        &[
            ("ADCRAFT__PIPELINE__VARIATIONS_PER_PLATFORM", "0"),
            ("ADCRAFT__BACKEND__REQUEST_TIMEOUT_SECS", "0"),
        ],
    )
    .load()
    .unwrap();

    let err = config.ensure_valid().unwrap_err().to_string();
    assert!(err.contains("Backend: request_timeout_secs must be greater than 0"));
    assert!(err.contains("Pipeline: variations_per_platform must be greater than 0"));
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[pipeline\nvariations = ").unwrap();

    let err = loader(temp_dir.path(), &[]).load().unwrap_err();
    assert!(matches!(err, adcraft::error::PipelineError::Config(_)));
}

#[tokio::test]
async fn test_config_drives_a_run() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = AdcraftConfig::default();
    config.pipeline.platforms = vec!["tiktok".to_string()];
    config.pipeline.variations_per_platform = 1;
    config.pipeline.compose = false;
    let output = config.output.resolved(temp_dir.path());

    let (_backend, client) = offline();
    let state = PipelineOrchestrator::new(client, config.pipeline.options().unwrap())
        .with_output_dirs(&output.images_dir, &output.ads_dir)
        .with_strategy_policy(config.pipeline.strategy_policy())
        .with_copy_policy(config.pipeline.copy_policy())
        .run(brief())
        .await
        .unwrap();

    assert_eq!(state.slots.len(), 1);
    assert_eq!(state.slots[0].platform, Platform::TikTok);
    let image = state.generated_images[0].as_ref().unwrap();
    assert!(image.image_path.starts_with(temp_dir.path().join("generated")));
}
