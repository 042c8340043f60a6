//! Gemini backend over the Generative Language REST API.
//!
//! Text goes through `generateContent`, plain image generation through the
//! Imagen `predict` endpoint, and composition onto a reference image through
//! `generateContent` with image response modalities.

use super::{
    build_backend_http_client, map_http_error, map_status_error, GenerationBackend, ImageData,
    ImageRequest, ImageResponse, TextRequest, TextResponse,
};
use crate::error::BackendError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
pub const DEFAULT_COMPOSE_MODEL: &str = "gemini-2.5-flash-image";

/// Connection settings for [`GeminiBackend`]
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub compose_model: String,
    pub request_timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            compose_model: DEFAULT_COMPOSE_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct GeminiBackend {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiBackend {
    pub fn new(settings: GeminiSettings) -> Result<Self, BackendError> {
        let client = build_backend_http_client(settings.request_timeout)?;
        Ok(Self { client, settings })
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                BackendError::NotConfigured(
                    "Gemini API key is not set (GEMINI_API_KEY or GOOGLE_API_KEY)".to_string(),
                )
            })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.settings.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post(&self, url: &str, body: &impl Serialize) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key()?)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn from_value(value: Value) -> Result<Self, BackendError> {
        let parsed: Self = serde_json::from_value(value)
            .map_err(|e| BackendError::MalformedResponse(format!("Unexpected response shape: {}", e)))?;
        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(BackendError::SafetyBlocked(format!("Prompt blocked: {}", reason)));
        }
        Ok(parsed)
    }

    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }
}

fn user_content(parts: Vec<Part>) -> Vec<Content> {
    vec![Content {
        role: Some("user".to_string()),
        parts,
    }]
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        inline_data: None,
    }
}

fn decode_image(encoded: &str, mime_type: Option<&str>) -> Result<ImageData, BackendError> {
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| BackendError::MalformedResponse(format!("Image base64 decode failed: {}", e)))?;
    Ok(ImageData {
        bytes,
        mime_type: mime_type.unwrap_or("image/png").to_string(),
    })
}

/// Pull `predictions[].bytesBase64Encoded` out of an Imagen `predict` response.
/// Filtered predictions carry no bytes and are skipped.
fn extract_predictions(payload: &Value) -> Result<Vec<ImageData>, BackendError> {
    let predictions = payload
        .get("predictions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut images = Vec::new();
    for prediction in predictions {
        if let Some(encoded) = prediction.get("bytesBase64Encoded").and_then(Value::as_str) {
            let mime_type = prediction.get("mimeType").and_then(Value::as_str);
            images.push(decode_image(encoded, mime_type)?);
        } else if let Some(reason) = prediction.get("raiFilteredReason").and_then(Value::as_str) {
            warn!(reason, "Imagen prediction filtered");
        }
    }
    Ok(images)
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn initialize(&self) -> Result<(), BackendError> {
        self.api_key()?;
        debug!(
            text_model = %self.settings.text_model,
            image_model = %self.settings.image_model,
            compose_model = %self.settings.compose_model,
            "Gemini backend configured"
        );
        Ok(())
    }

    async fn generate_text(&self, request: TextRequest) -> Result<TextResponse, BackendError> {
        let options = &request.options;
        let mut config = GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens,
            top_p: options.top_p,
            ..GenerationConfig::default()
        };
        if let Some(schema) = &request.response_schema {
            config.response_mime_type = Some("application/json".to_string());
            config.response_schema = Some(schema.schema.clone());
        }
        let body = GenerateContentRequest {
            contents: user_content(vec![text_part(&request.prompt)]),
            generation_config: Some(config),
        };

        let url = self.endpoint(&self.settings.text_model, "generateContent");
        let response = GenerateContentResponse::from_value(self.post(&url, &body).await?)?;

        let finish_reason = response
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.clone());
        if finish_reason.as_deref() == Some("SAFETY") {
            return Err(BackendError::SafetyBlocked(
                "Candidate blocked by safety filter".to_string(),
            ));
        }

        let text: String = response
            .parts()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if response.candidates.is_empty() {
            return Err(BackendError::MalformedResponse(
                "No candidates in response".to_string(),
            ));
        }

        Ok(TextResponse {
            text,
            model: response
                .model_version
                .unwrap_or_else(|| self.settings.text_model.clone()),
            finish_reason,
        })
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<ImageResponse, BackendError> {
        match &request.reference_image {
            None => {
                let body = json!({
                    "instances": [{ "prompt": request.prompt }],
                    "parameters": { "sampleCount": request.number_of_images.max(1) },
                });
                let url = self.endpoint(&self.settings.image_model, "predict");
                let payload = self.post(&url, &body).await?;
                Ok(ImageResponse {
                    images: extract_predictions(&payload)?,
                })
            }
            Some(reference) => {
                let body = GenerateContentRequest {
                    contents: user_content(vec![
                        text_part(&request.prompt),
                        Part {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: reference.mime_type.clone(),
                                data: BASE64.encode(&reference.bytes),
                            }),
                        },
                    ]),
                    generation_config: Some(GenerationConfig {
                        response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                        ..GenerationConfig::default()
                    }),
                };
                let url = self.endpoint(&self.settings.compose_model, "generateContent");
                let response = GenerateContentResponse::from_value(self.post(&url, &body).await?)?;
                let images = response
                    .parts()
                    .filter_map(|part| part.inline_data.as_ref())
                    .filter(|inline| !inline.data.is_empty())
                    .map(|inline| decode_image(&inline.data, Some(&inline.mime_type)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ImageResponse { images })
            }
        }
    }

    fn backend_name(&self) -> &str {
        "gemini"
    }

    fn text_model(&self) -> &str {
        &self.settings.text_model
    }

    fn image_model(&self) -> &str {
        &self.settings.image_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GenerationOptions, ResponseSchema};
    use mockito::{Matcher, Server};

    fn backend_for(url: &str, api_key: Option<&str>) -> GeminiBackend {
        GeminiBackend::new(GeminiSettings {
            api_key: api_key.map(str::to_string),
            base_url: url.to_string(),
            ..GeminiSettings::default()
        })
        .unwrap()
    }

    fn text_request(schema: Option<ResponseSchema>) -> TextRequest {
        TextRequest {
            prompt: "Write five angles".to_string(),
            response_schema: schema,
            options: GenerationOptions::with_temperature(0.5),
        }
    }

    #[tokio::test]
    async fn initialize_requires_api_key() {
        let backend = backend_for("http://127.0.0.1:9", None);
        let err = backend.initialize().await.unwrap_err();
        assert!(matches!(err, BackendError::NotConfigured(_)));

        let blank = backend_for("http://127.0.0.1:9", Some("  "));
        assert!(blank.initialize().await.is_err());
    }

    #[tokio::test]
    async fn structured_text_request_sends_schema() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "temperature": 0.5
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "{\"prompts\":"}, {"text": "[]}"}]},
                        "finishReason": "STOP"
                    }],
                    "modelVersion": "gemini-2.5-flash-001"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("test-key"));
        let schema = ResponseSchema::new("strategic_prompts", json!({"type": "OBJECT"}));
        let response = backend.generate_text(text_request(Some(schema))).await.unwrap();

        assert_eq!(response.text, "{\"prompts\":[]}");
        assert_eq!(response.model, "gemini-2.5-flash-001");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_codes_map_to_backend_errors() {
        let mut server = Server::new_async().await;
        let _auth = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(401)
            .with_body("API key not valid")
            .create_async()
            .await;
        let _quota = server
            .mock("POST", "/models/imagen-3.0-generate-002:predict")
            .with_status(429)
            .with_body("Resource exhausted")
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("bad-key"));
        let err = backend.generate_text(text_request(None)).await.unwrap_err();
        assert!(matches!(err, BackendError::AuthFailed(_)));

        let err = backend
            .generate_images(ImageRequest {
                prompt: "a bottle".to_string(),
                reference_image: None,
                number_of_images: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::RateLimited(_)));
    }

    #[tokio::test]
    async fn blocked_prompt_is_safety_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string())
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("test-key"));
        let err = backend.generate_text(text_request(None)).await.unwrap_err();
        assert!(matches!(err, BackendError::SafetyBlocked(_)));
    }

    #[tokio::test]
    async fn imagen_predictions_are_decoded() {
        let mut server = Server::new_async().await;
        let encoded = BASE64.encode(b"png-bytes");
        let _mock = server
            .mock("POST", "/models/imagen-3.0-generate-002:predict")
            .match_body(Matcher::PartialJson(json!({"parameters": {"sampleCount": 1}})))
            .with_status(200)
            .with_body(
                json!({
                    "predictions": [
                        {"bytesBase64Encoded": encoded, "mimeType": "image/png"},
                        {"raiFilteredReason": "filtered"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("test-key"));
        let response = backend
            .generate_images(ImageRequest {
                prompt: "a bottle on a trail".to_string(),
                reference_image: None,
                number_of_images: 1,
            })
            .await
            .unwrap();
        assert_eq!(response.images.len(), 1);
        assert_eq!(response.images[0].bytes, b"png-bytes".to_vec());
    }

    #[tokio::test]
    async fn empty_predictions_yield_zero_images() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/imagen-3.0-generate-002:predict")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("test-key"));
        let response = backend
            .generate_images(ImageRequest {
                prompt: "nothing".to_string(),
                reference_image: None,
                number_of_images: 1,
            })
            .await
            .unwrap();
        assert!(response.images.is_empty());
    }

    #[tokio::test]
    async fn composition_returns_inline_images() {
        let mut server = Server::new_async().await;
        let composed = BASE64.encode(b"composed");
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash-image:generateContent")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [
                            {"text": "Here is your ad"},
                            {"inlineData": {"mimeType": "image/png", "data": composed}}
                        ]}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = backend_for(&server.url(), Some("test-key"));
        let response = backend
            .generate_images(ImageRequest {
                prompt: "Compose the ad".to_string(),
                reference_image: Some(ImageData::png(b"base".to_vec())),
                number_of_images: 1,
            })
            .await
            .unwrap();
        assert_eq!(response.images.len(), 1);
        assert_eq!(response.images[0].bytes, b"composed".to_vec());
    }
}
