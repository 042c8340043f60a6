//! Generation Client
//!
//! Narrow capability interface over the hosted text and image generation
//! backends. [`GenerationBackend`] is implemented per backend; every pipeline
//! component talks to a shared [`GenerationClient`], which owns one-time backend
//! initialization and bounds each call with a timeout.

use crate::error::{BackendError, PipelineError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub mod gemini;
pub mod scripted;

pub use gemini::{GeminiBackend, GeminiSettings};
pub use scripted::ScriptedBackend;

/// Sampling options for text generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,       // 0.0-2.0
    pub max_output_tokens: Option<u32>, // Maximum tokens to generate
    pub top_p: Option<f32>,             // Nucleus sampling
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

/// Structured-output contract: a name for diagnostics plus the JSON schema
/// (OpenAPI subset) the backend is asked to conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    pub response_schema: Option<ResponseSchema>,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone)]
pub struct TextResponse {
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Raw image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/png".to_string(),
        }
    }
}

/// Image request. A request carrying a reference image asks the backend to
/// compose onto that image instead of generating from scratch.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub reference_image: Option<ImageData>,
    pub number_of_images: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub images: Vec<ImageData>,
}

/// Generation backend trait
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Validate credentials and prepare the backend. Called at most once.
    async fn initialize(&self) -> Result<(), BackendError>;

    /// Generate free text, or JSON conforming to `response_schema` when set
    async fn generate_text(&self, request: TextRequest) -> Result<TextResponse, BackendError>;

    /// Generate zero or more images, or compose onto a reference image
    async fn generate_images(&self, request: ImageRequest) -> Result<ImageResponse, BackendError>;

    /// Get the backend name
    fn backend_name(&self) -> &str;

    /// Get the text model name
    fn text_model(&self) -> &str;

    /// Get the image model name
    fn image_model(&self) -> &str;
}

/// Long-lived service object handed to every pipeline component.
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    init: OnceCell<Result<(), String>>,
    call_timeout: Duration,
}

impl GenerationClient {
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::with_timeout(backend, Self::DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<dyn GenerationBackend>, call_timeout: Duration) -> Self {
        Self {
            backend,
            init: OnceCell::new(),
            call_timeout,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub fn text_model(&self) -> &str {
        self.backend.text_model()
    }

    pub fn image_model(&self) -> &str {
        self.backend.image_model()
    }

    /// Initialize the backend once. The outcome is cached: a failed
    /// initialization is reported as a configuration error on every call and
    /// is never retried.
    pub async fn ensure_initialized(&self) -> Result<(), PipelineError> {
        let outcome = self
            .init
            .get_or_init(|| async {
                info!(backend = %self.backend.backend_name(), "Initializing generation backend");
                self.backend.initialize().await.map_err(|e| e.to_string())
            })
            .await;
        outcome.clone().map_err(PipelineError::Config)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.init.get(), Some(Ok(())))
    }

    /// Generate text. With a schema the backend is asked for structured JSON.
    pub async fn generate_text(
        &self,
        prompt: &str,
        response_schema: Option<&ResponseSchema>,
        options: &GenerationOptions,
    ) -> Result<TextResponse, PipelineError> {
        self.ensure_initialized().await?;
        let request = TextRequest {
            prompt: prompt.to_string(),
            response_schema: response_schema.cloned(),
            options: options.clone(),
        };
        let start = Instant::now();
        let response = self
            .bounded("text", self.backend.generate_text(request))
            .await?;
        debug!(
            model = %response.model,
            duration_ms = start.elapsed().as_millis(),
            response_chars = response.text.chars().count(),
            "Text response received"
        );
        Ok(response)
    }

    /// Generate structured output and deserialize it. Anything that does not
    /// parse into `T` is a schema validation error; the raw text is returned
    /// alongside the value for traceability.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        response_schema: &ResponseSchema,
        options: &GenerationOptions,
    ) -> Result<(T, String), PipelineError> {
        let response = self
            .generate_text(prompt, Some(response_schema), options)
            .await?;
        let value = parse_structured(&response.text, &response_schema.name)?;
        Ok((value, response.text))
    }

    /// Generate `count` images from a prompt. Zero images is a valid response.
    pub async fn generate_images(
        &self,
        prompt: &str,
        count: u32,
    ) -> Result<ImageResponse, PipelineError> {
        self.ensure_initialized().await?;
        let request = ImageRequest {
            prompt: prompt.to_string(),
            reference_image: None,
            number_of_images: count.max(1),
        };
        self.bounded("image", self.backend.generate_images(request))
            .await
    }

    /// Compose onto a reference image.
    pub async fn compose_image(
        &self,
        prompt: &str,
        reference: ImageData,
    ) -> Result<ImageResponse, PipelineError> {
        self.ensure_initialized().await?;
        let request = ImageRequest {
            prompt: prompt.to_string(),
            reference_image: Some(reference),
            number_of_images: 1,
        };
        self.bounded("compose", self.backend.generate_images(request))
            .await
    }

    async fn bounded<T, F>(&self, kind: &str, call: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map_err(PipelineError::from),
            Err(_) => {
                warn!(
                    kind,
                    timeout_secs = self.call_timeout.as_secs(),
                    "Backend call timed out"
                );
                Err(BackendError::Timeout(self.call_timeout).into())
            }
        }
    }
}

/// Strip enclosing markdown code fences (```json ... ```) from backend output.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    let without_close = without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open);
    without_close.trim().to_string()
}

/// Parse backend JSON into `T`, tolerating surrounding code fences.
pub fn parse_structured<T: DeserializeOwned>(raw: &str, schema_name: &str) -> Result<T, PipelineError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| {
        PipelineError::SchemaValidation(format!(
            "{} response did not match schema: {}",
            schema_name, e
        ))
    })
}

/// Map transport-level reqwest errors to backend errors
fn map_http_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        BackendError::RequestFailed(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        map_status_error(status.as_u16(), &error.to_string())
    } else {
        BackendError::RequestFailed(format!("HTTP error: {}", error))
    }
}

/// Map a non-success HTTP status and its body to a backend error
fn map_status_error(status: u16, body: &str) -> BackendError {
    match status {
        401 | 403 => BackendError::AuthFailed(format!("Authentication failed: {}", body)),
        404 => BackendError::ModelNotFound(format!("Model not found: {}", body)),
        429 => BackendError::RateLimited(format!("Rate limit exceeded: {}", body)),
        400 if body.to_lowercase().contains("safety") => {
            BackendError::SafetyBlocked(body.to_string())
        }
        _ => BackendError::RequestFailed(format!("Request failed with status {}: {}", status, body)),
    }
}

const BACKEND_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_backend_http_client(request_timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .connect_timeout(BACKEND_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| BackendError::InitializationFailed(format!("Failed to create HTTP client: {}", e)))
}
