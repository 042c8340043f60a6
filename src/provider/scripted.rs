//! In-process backend driven by closures.
//!
//! Used by tests to script backend behavior and by `--offline` runs, where
//! [`ScriptedBackend::offline`] answers every request with canned content that
//! satisfies the requested schema.

use super::{GenerationBackend, ImageData, ImageRequest, ImageResponse, TextRequest, TextResponse};
use crate::error::BackendError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type TextScript = Box<dyn Fn(&TextRequest) -> Result<String, BackendError> + Send + Sync>;
type ImageScript = Box<dyn Fn(&ImageRequest) -> Result<Vec<ImageData>, BackendError> + Send + Sync>;

/// A 1x1 transparent PNG.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

pub struct ScriptedBackend {
    name: String,
    text: Option<TextScript>,
    images: Option<ImageScript>,
    init_failure: Option<String>,
    latency: Option<Duration>,
    init_calls: AtomicUsize,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    compose_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Backend with no scripts; every generation call fails until scripted.
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            text: None,
            images: None,
            init_failure: None,
            latency: None,
            init_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            compose_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Canned, schema-conforming answers and placeholder images.
    pub fn offline() -> Self {
        let mut backend = Self::new().with_text(offline_text).with_images(|request| {
            let count = request.number_of_images.max(1) as usize;
            Ok(vec![ImageData::png(PLACEHOLDER_PNG.to_vec()); count])
        });
        backend.name = "offline".to_string();
        backend
    }

    pub fn with_text<F>(mut self, script: F) -> Self
    where
        F: Fn(&TextRequest) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        self.text = Some(Box::new(script));
        self
    }

    pub fn with_images<F>(mut self, script: F) -> Self
    where
        F: Fn(&ImageRequest) -> Result<Vec<ImageData>, BackendError> + Send + Sync + 'static,
    {
        self.images = Some(Box::new(script));
        self
    }

    pub fn with_init_failure(mut self, message: impl Into<String>) -> Self {
        self.init_failure = Some(message.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    /// Plain image generation calls (composition excluded).
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn compose_calls(&self) -> usize {
        self.compose_calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, text and image, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn initialize(&self) -> Result<(), BackendError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        match &self.init_failure {
            Some(message) => Err(BackendError::NotConfigured(message.clone())),
            None => Ok(()),
        }
    }

    async fn generate_text(&self, request: TextRequest) -> Result<TextResponse, BackendError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());
        self.simulate_latency().await;
        let script = self
            .text
            .as_ref()
            .ok_or_else(|| BackendError::RequestFailed("no text script configured".to_string()))?;
        Ok(TextResponse {
            text: script(&request)?,
            model: self.text_model().to_string(),
            finish_reason: Some("STOP".to_string()),
        })
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<ImageResponse, BackendError> {
        if request.reference_image.is_some() {
            self.compose_calls.fetch_add(1, Ordering::SeqCst);
        } else {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.prompts.lock().push(request.prompt.clone());
        self.simulate_latency().await;
        let script = self
            .images
            .as_ref()
            .ok_or_else(|| BackendError::RequestFailed("no image script configured".to_string()))?;
        Ok(ImageResponse {
            images: script(&request)?,
        })
    }

    fn backend_name(&self) -> &str {
        &self.name
    }

    fn text_model(&self) -> &str {
        "scripted-text"
    }

    fn image_model(&self) -> &str {
        "scripted-image"
    }
}

/// Requested item count for an array property, read from its `minItems`.
fn requested_count(schema: &Value, property: &str) -> usize {
    schema
        .pointer(&format!("/properties/{}/minItems", property))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(3)
}

/// Canned answer for `request`, keyed on its schema name.
pub fn offline_text(request: &TextRequest) -> Result<String, BackendError> {
    let Some(schema) = &request.response_schema else {
        return Ok(OFFLINE_VISUAL_PROMPT.to_string());
    };
    let value = match schema.name.as_str() {
        crate::strategy::RESPONSE_SCHEMA_NAME => json!({
            "prompts": [
                "Speak to the quiet pride of people who plan ahead and carry gear that never lets them down on long days outside.",
                "Lay out the practical numbers: how long it lasts, what it replaces, and why the price pays for itself within a season.",
                "Give a reason to act this week with a limited launch offer that rewards people who decide before the weekend.",
                "Lead with the single most tangible benefit and show it in a moment the audience already lives every week.",
                "Contrast the product with the generic alternatives and name the one detail nobody else bothered to get right."
            ]
        }),
        crate::copywriter::VARIANTS_SCHEMA_NAME => {
            let count = requested_count(&schema.schema, "variants");
            let variants: Vec<Value> = (1..=count)
                .map(|i| {
                    json!({
                        "headline": format!("Made for the long way round #{}", i),
                        "body": "Built to keep up wherever you go. Tested outdoors, trusted by people who never stay in. Grab yours today."
                    })
                })
                .collect();
            json!({ "variants": variants })
        }
        crate::copywriter::CAMPAIGN_SCHEMA_NAME => {
            let count = requested_count(&schema.schema, "Facebook");
            let ads = |platform: &str| -> Vec<String> {
                (1..=count)
                    .map(|i| format!("{} ad {}: Built to keep up wherever you go.", platform, i))
                    .collect()
            };
            json!({
                "Facebook": ads("Facebook"),
                "Google": ads("Google"),
                "TikTok": ads("TikTok"),
            })
        }
        other => {
            return Err(BackendError::RequestFailed(format!(
                "offline backend has no answer for schema '{}'",
                other
            )))
        }
    };
    Ok(value.to_string())
}

const OFFLINE_VISUAL_PROMPT: &str = "A bright lifestyle photograph of the product resting on a \
weathered wooden table beside an open trail map, a folded wool blanket and a pair of scuffed hiking \
boots. Morning light streams in from the left, casting long soft shadows and warming the natural \
textures. The product sits slightly off center in the foreground, label turned toward the viewer, \
with fine condensation on its surface to suggest freshness. In the softly blurred background a \
couple laughs while lacing up their boots near an open doorway that frames pine trees and distant \
hills. The palette leans on forest greens, warm ambers and clean whites. Shot at eye level with a \
shallow depth of field, the composition leaves generous empty space at the top for a headline and \
keeps the scene uncluttered, honest and inviting.";
