//! Strategic prompt retries and the fixed fallback set

use super::test_utils::{brief, client_for};
use adcraft::error::{BackendError, PipelineError};
use adcraft::model::Platform;
use adcraft::pipeline::{PipelineOptions, PipelineOrchestrator};
use adcraft::provider::{scripted, ScriptedBackend};
use adcraft::retry::RetryPolicy;
use adcraft::strategy::{self, StrategicPromptExpander};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn is_strategy_request(request: &adcraft::provider::TextRequest) -> bool {
    request
        .response_schema
        .as_ref()
        .is_some_and(|schema| schema.name == strategy::RESPONSE_SCHEMA_NAME)
}

#[tokio::test]
async fn test_run_falls_back_after_exhausting_attempts() {
    let temp_dir = TempDir::new().unwrap();
    let strategy_calls = Arc::new(AtomicUsize::new(0));
    let counter = strategy_calls.clone();
    let backend = Arc::new(ScriptedBackend::offline().with_text(move |request| {
        if is_strategy_request(request) {
            counter.fetch_add(1, Ordering::SeqCst);
            return Ok("Here are some ideas: be bold, be brief.".to_string());
        }
        scripted::offline_text(request)
    }));

    let options = PipelineOptions {
        platforms: vec![Platform::Google],
        variations_per_platform: 1,
        run_id: Some("fallback".to_string()),
        ..PipelineOptions::default()
    };
    let state = PipelineOrchestrator::new(client_for(&backend), options)
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .run(brief())
        .await
        .unwrap();

    assert_eq!(strategy_calls.load(Ordering::SeqCst), 5);
    assert!(state.strategies_used_fallback);
    assert_eq!(state.strategic_prompts, Some(strategy::fallback_prompts()));
    assert!(state.failures.is_empty());
    assert!(state
        .final_recommendation
        .unwrap()
        .contains("fell back to the default set"));
}

#[tokio::test]
async fn test_wrong_prompt_count_is_retried_until_valid() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = Arc::new(ScriptedBackend::new().with_text(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let prompts: Vec<String> = (0..if n == 0 { 4 } else { 5 })
            .map(|i| format!("Angle number {}", i + 1))
            .collect();
        Ok(serde_json::json!({ "prompts": prompts }).to_string())
    }));

    let outcome = StrategicPromptExpander::new(client_for(&backend))
        .expand(&brief())
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 2);
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.prompts.len(), 5);
    assert_eq!(outcome.prompts.angle_for(0), "Angle number 1");
}

#[tokio::test]
async fn test_policy_attempt_cap_is_honored() {
    let backend = Arc::new(ScriptedBackend::new().with_text(|_| Ok("{}".to_string())));
    let outcome = StrategicPromptExpander::new(client_for(&backend))
        .with_policy(RetryPolicy::with_attempts(2))
        .expand(&brief())
        .await
        .unwrap();

    assert_eq!(backend.text_calls(), 2);
    assert!(outcome.used_fallback);
}

#[tokio::test]
async fn test_rate_limit_aborts_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::offline().with_text(|request| {
        if is_strategy_request(request) {
            return Err(BackendError::RateLimited("quota exhausted".to_string()));
        }
        scripted::offline_text(request)
    }));

    let err = PipelineOrchestrator::new(client_for(&backend), PipelineOptions::default())
        .with_output_dirs(temp_dir.path().join("generated"), temp_dir.path().join("ads"))
        .run(brief())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Backend(BackendError::RateLimited(_))
    ));
    assert_eq!(backend.text_calls(), 1);
    assert_eq!(backend.image_calls(), 0);
}
