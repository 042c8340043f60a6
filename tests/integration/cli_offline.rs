//! CLI route table exercised with the offline backend

use adcraft::cli::{Cli, RunContext};
use adcraft::config::AdcraftConfig;
use adcraft::error::PipelineError;
use adcraft::model::AdCopyExport;
use clap::Parser;
use tempfile::TempDir;

fn context(root: &std::path::Path, offline: bool) -> RunContext {
    RunContext::from_config(root.to_path_buf(), None, AdcraftConfig::default())
        .unwrap()
        .with_offline(offline)
        .with_quiet(true)
}

async fn run(ctx: &RunContext, args: &[&str]) -> Result<String, PipelineError> {
    let mut argv = vec!["adcraft"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    ctx.execute(&cli.command).await
}

const BRIEF: [&str; 4] = ["--product", "Trail water bottle", "--audience", "Hikers"];

#[tokio::test]
async fn test_generate_json_and_export() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);
    let mut args = vec!["generate"];
    args.extend_from_slice(&BRIEF);
    args.extend_from_slice(&[
        "--platforms",
        "Facebook,Google",
        "--variations",
        "1",
        "--run-id",
        "cli",
        "--export",
        "ads.json",
        "--format",
        "json",
    ]);

    let output = run(&ctx, &args).await.unwrap();
    let state: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(state["run_id"], "cli");
    assert_eq!(state["slots"].as_array().unwrap().len(), 2);
    assert!(state["failures"].as_array().unwrap().is_empty());
    assert!(temp_dir.path().join("ads/cli/facebook_ad_1.png").is_file());

    let export = AdCopyExport::read_from(&temp_dir.path().join("ads.json")).unwrap();
    assert_eq!(export.facebook.len(), 1);
    assert_eq!(export.google.len(), 1);
    assert!(export.tiktok.is_empty());
}

#[tokio::test]
async fn test_campaign_copy_writes_out_file() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);
    let mut args = vec!["campaign-copy"];
    args.extend_from_slice(&BRIEF);
    args.extend_from_slice(&["--count", "2", "--out", "exports/ads.json"]);

    let output = run(&ctx, &args).await.unwrap();
    assert!(output.contains("TikTok"));
    let export = AdCopyExport::read_from(&temp_dir.path().join("exports/ads.json")).unwrap();
    export.validate(2).unwrap();
}

#[tokio::test]
async fn test_strategies_json_lists_five_angles() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);
    let mut args = vec!["strategies"];
    args.extend_from_slice(&BRIEF);
    args.extend_from_slice(&["--format", "json"]);

    let output = run(&ctx, &args).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["prompts"].as_array().unwrap().len(), 5);
    assert_eq!(value["used_fallback"], false);
}

#[tokio::test]
async fn test_compose_without_base_image_fails() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);
    let err = run(&ctx, &["compose", "--ad-copy", "Stay cold."])
        .await
        .unwrap_err();
    match err {
        PipelineError::MissingResource { kind, path } => {
            assert_eq!(kind, "Base image");
            assert_eq!(path, temp_dir.path().join("images/image.png"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_compose_with_default_base_image() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("images")).unwrap();
    std::fs::write(
        temp_dir.path().join("images/image.png"),
        adcraft::provider::scripted::PLACEHOLDER_PNG,
    )
    .unwrap();
    let ctx = context(temp_dir.path(), true);

    let output = run(
        &ctx,
        &["compose", "--ad-copy", "Stay cold.", "--platform", "tiktok", "--format", "json"],
    )
    .await
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["kind"], "Creative");
    assert!(temp_dir.path().join("ads/tiktok_ad.png").is_file());
}

#[tokio::test]
async fn test_live_backend_requires_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), false);
    let mut args = vec!["strategies"];
    args.extend_from_slice(&BRIEF);

    let err = run(&ctx, &args).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(err
        .to_string()
        .contains("Missing required environment variables: GEMINI_API_KEY or GOOGLE_API_KEY"));
}

#[tokio::test]
async fn test_config_commands_need_no_backend() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), false);
    let shown = run(&ctx, &["config", "show"]).await.unwrap();
    assert!(shown.contains("[pipeline]"));
    assert!(shown.contains("variations_per_platform = 3"));
    assert!(run(&ctx, &["config", "validate"]).await.is_ok());
}

#[tokio::test]
async fn test_invalid_brief_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);
    let err = run(&ctx, &["strategies", "--product", "  ", "--audience", "Hikers"])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidBrief(_)));
}

#[tokio::test]
async fn test_generate_rejects_repeated_platform_and_unsafe_run_id() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(temp_dir.path(), true);

    let mut repeated = vec!["generate"];
    repeated.extend_from_slice(&BRIEF);
    repeated.extend_from_slice(&["--platforms", "Facebook,facebook", "--variations", "1"]);
    let err = run(&ctx, &repeated).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));

    let mut escaping = vec!["generate"];
    escaping.extend_from_slice(&BRIEF);
    escaping.extend_from_slice(&["--variations", "1", "--run-id", "../../outside"]);
    let err = run(&ctx, &escaping).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!temp_dir.path().join("ads").exists());
}
