//! Platform copy export (`ads.json`) persistence

use super::test_utils::{brief, offline};
use adcraft::copywriter::CopyGenerator;
use adcraft::error::PipelineError;
use adcraft::model::{AdCopyExport, Platform};
use adcraft::pipeline::{PipelineOptions, PipelineOrchestrator};
use tempfile::TempDir;

#[tokio::test]
async fn test_campaign_copy_export_survives_disk() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, client) = offline();
    let export = CopyGenerator::new(client)
        .generate_campaign_copy(&brief(), 2)
        .await
        .unwrap();
    export.validate(2).unwrap();

    let path = temp_dir.path().join("out/ads.json");
    export.write_to(&path).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["Facebook", "Google", "TikTok"]);

    assert_eq!(AdCopyExport::read_from(&path).unwrap(), export);
}

#[test]
fn test_unknown_platform_keys_are_rejected() {
    let raw = r#"{"Facebook": [], "Google": [], "TikTok": [], "Instagram": ["hi"]}"#;
    assert!(AdCopyExport::from_json(raw).is_err());
}

#[test]
fn test_wrong_variation_count_fails_validation() {
    let export = AdCopyExport {
        facebook: vec!["one".into(), "two".into()],
        google: vec!["one".into()],
        tiktok: vec!["one".into(), "two".into()],
    };
    let err = export.validate(2).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaValidation(_)));
    assert!(err.to_string().contains("Google has 1 ad variations, expected 2"));
}

#[tokio::test]
async fn test_run_export_groups_copy_by_platform() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, client) = offline();
    let options = PipelineOptions {
        platforms: vec![
            Platform::TikTok,
            Platform::Other("Pinterest".to_string()),
        ],
        variations_per_platform: 2,
        compose: false,
        run_id: Some("export".to_string()),
        ..PipelineOptions::default()
    };
    let state = PipelineOrchestrator::new(client, options)
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .run(brief())
        .await
        .unwrap();

    let export = state.export_copy();
    assert_eq!(export.tiktok.len(), 2);
    assert!(export.facebook.is_empty());
    assert!(export.google.is_empty());
    assert_eq!(state.copy_count(), 4);
}
