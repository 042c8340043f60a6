//! Gemini HTTP backend driven through the strategy stage

use super::test_utils::brief;
use adcraft::error::{BackendError, PipelineError};
use adcraft::provider::{GeminiBackend, GeminiSettings, GenerationClient};
use adcraft::strategy::StrategicPromptExpander;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

fn client(url: &str) -> Arc<GenerationClient> {
    let backend = GeminiBackend::new(GeminiSettings {
        api_key: Some("test-key".to_string()),
        base_url: url.to_string(),
        ..GeminiSettings::default()
    })
    .unwrap();
    Arc::new(GenerationClient::new(Arc::new(backend)))
}

fn candidate(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_strategies_come_from_structured_response() {
    let mut server = Server::new_async().await;
    let prompts: Vec<String> = (1..=5).map(|i| format!("Angle {}", i)).collect();
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate(&json!({ "prompts": prompts }).to_string()))
        .expect(1)
        .create_async()
        .await;

    let outcome = StrategicPromptExpander::new(client(&server.url()))
        .expand(&brief())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.prompts.angle_for(4), "Angle 5");
}

#[tokio::test]
async fn test_fenced_json_is_accepted() {
    let mut server = Server::new_async().await;
    let prompts: Vec<String> = (1..=5).map(|i| format!("Fenced {}", i)).collect();
    let fenced = format!("```json\n{}\n```", json!({ "prompts": prompts }));
    server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate(&fenced))
        .create_async()
        .await;

    let outcome = StrategicPromptExpander::new(client(&server.url()))
        .expand(&brief())
        .await
        .unwrap();
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.prompts.angle_for(0), "Fenced 1");
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(401)
        .with_body(r#"{"error": {"message": "API key not valid"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = StrategicPromptExpander::new(client(&server.url()))
        .expand(&brief())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        PipelineError::Backend(BackendError::AuthFailed(_))
    ));
}
