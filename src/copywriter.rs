//! Per-platform ad copy generation.
//!
//! Copy is requested as structured JSON. A response that is not JSON at all
//! is read as free text through the [`MarkerParser`].

pub mod markers;

pub use markers::{MarkerParser, ParsedVariant};

use crate::error::PipelineError;
use crate::model::{AdCopy, AdCopyExport, CreativeBrief, Platform, SlotRef};
use crate::provider::{strip_code_fences, GenerationClient, GenerationOptions, ResponseSchema};
use crate::retry::{is_retryable, RetryPolicy};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const VARIANTS_SCHEMA_NAME: &str = "ad_copy_variants";
pub const CAMPAIGN_SCHEMA_NAME: &str = "campaign_copy";
pub const DEFAULT_VARIATIONS: usize = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Prompt-level style guidance per platform.
pub fn platform_style(platform: &Platform) -> &'static str {
    match platform {
        Platform::Facebook => {
            "5 sentences, conversational and community-focused, encouraging engagement. \
             0-2 tasteful hashtags; emojis allowed."
        }
        Platform::TikTok => {
            "5 sentences, playful, catchy, viral style. Encourage trends or FOMO. \
             0-2 hashtags; emojis allowed."
        }
        Platform::Google => {
            "Concise, professional and conversion-focused. Highlight trust and value. \
             No emojis, no hashtags, no markdown."
        }
        Platform::Other(_) => "Clear, persuasive, benefits-first. Keep each variation 1-3 sentences.",
    }
}

/// One copy request: `count` variants for `platform`, with angles assigned
/// to variants round-robin.
#[derive(Debug, Clone, Copy)]
pub struct CopyRequest<'a> {
    pub brief: &'a CreativeBrief,
    pub platform: &'a Platform,
    pub count: usize,
    pub angles: &'a [String],
}

impl<'a> CopyRequest<'a> {
    pub fn new(brief: &'a CreativeBrief, platform: &'a Platform, count: usize) -> Self {
        Self {
            brief,
            platform,
            count,
            angles: &[],
        }
    }

    pub fn with_angles(mut self, angles: &'a [String]) -> Self {
        self.angles = angles;
        self
    }

    fn angle_for(&self, variation: usize) -> Option<&'a str> {
        if self.angles.is_empty() {
            None
        } else {
            Some(self.angles[variation % self.angles.len()].as_str())
        }
    }
}

#[derive(Debug, Deserialize)]
struct VariantsPayload {
    variants: Vec<VariantPayload>,
}

#[derive(Debug, Deserialize)]
struct VariantPayload {
    headline: String,
    body: String,
}

/// What one attempt produced before it is turned into [`AdCopy`] values.
enum ParsedCopy {
    Structured(Vec<VariantPayload>),
    FreeText(Vec<ParsedVariant>),
}

pub struct CopyGenerator {
    client: Arc<GenerationClient>,
    policy: RetryPolicy,
    options: GenerationOptions,
    parser: MarkerParser,
}

impl CopyGenerator {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            policy: RetryPolicy::with_attempts(DEFAULT_MAX_ATTEMPTS),
            options: GenerationOptions::default(),
            parser: MarkerParser::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate exactly `request.count` variants. The outer error fails the
    /// whole request (validation exhausted, backend failure); inner errors
    /// belong to a single variant.
    #[instrument(skip(self, request), fields(platform = %request.platform, count = request.count))]
    pub async fn generate(
        &self,
        request: &CopyRequest<'_>,
    ) -> Result<Vec<Result<AdCopy, PipelineError>>, PipelineError> {
        if request.count == 0 {
            return Ok(Vec::new());
        }
        let prompt = build_prompt(request);
        let schema = variants_schema(request.count);

        let outcome = self
            .policy
            .retry(
                "ad_copy",
                |attempt| {
                    let prompt = &prompt;
                    let schema = &schema;
                    async move {
                        let response = self
                            .client
                            .generate_text(prompt, Some(schema), &self.options)
                            .await?;
                        debug!(attempt, "Copy response received");
                        self.parse_response(&response.text, request.count)
                    }
                },
                is_retryable,
            )
            .await?;

        let results: Vec<Result<AdCopy, PipelineError>> = match outcome.value {
            ParsedCopy::Structured(variants) => variants
                .into_iter()
                .enumerate()
                .map(|(i, variant)| {
                    Ok(AdCopy {
                        slot: SlotRef::new(request.platform.clone(), i),
                        headline: variant.headline.trim().to_string(),
                        body: variant.body.trim().to_string(),
                        generation_prompt: prompt.clone(),
                        strategic_angle: request.angle_for(i).map(str::to_string),
                        image_prompt_hint: None,
                    })
                })
                .collect(),
            ParsedCopy::FreeText(mut variants) => {
                variants.resize_with(request.count.max(variants.len()), ParsedVariant::default);
                variants
                    .into_iter()
                    .take(request.count)
                    .enumerate()
                    .map(|(i, variant)| {
                        let slot = SlotRef::new(request.platform.clone(), i);
                        let text = variant.ad_copy.ok_or_else(|| PipelineError::MarkerNotFound {
                            marker: markers::AD_COPY_MARKER.to_string(),
                        })?;
                        let mut copy = AdCopy::from_text(slot, &text, prompt.clone());
                        if copy.headline.is_empty() || copy.body.is_empty() {
                            return Err(PipelineError::SchemaValidation(format!(
                                "copy variant {} has an empty headline or body",
                                i + 1
                            )));
                        }
                        copy.strategic_angle = request.angle_for(i).map(str::to_string);
                        copy.image_prompt_hint = variant.image_prompt;
                        Ok(copy)
                    })
                    .collect()
            }
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            attempts = outcome.attempts,
            produced = results.len() - failed,
            failed,
            "Ad copy generated"
        );
        Ok(results)
    }

    fn parse_response(&self, raw: &str, count: usize) -> Result<ParsedCopy, PipelineError> {
        let cleaned = strip_code_fences(raw);
        let value: Value = match serde_json::from_str(&cleaned) {
            Ok(value) => value,
            Err(_) => {
                warn!("Copy response is not JSON, parsing Ad Copy markers");
                return Ok(ParsedCopy::FreeText(self.parser.variants(&cleaned)));
            }
        };
        let payload: VariantsPayload = serde_json::from_value(value).map_err(|e| {
            PipelineError::SchemaValidation(format!(
                "{} response did not match schema: {}",
                VARIANTS_SCHEMA_NAME, e
            ))
        })?;
        if payload.variants.len() != count {
            return Err(PipelineError::SchemaValidation(format!(
                "expected {} copy variants, got {}",
                count,
                payload.variants.len()
            )));
        }
        if let Some(index) = payload
            .variants
            .iter()
            .position(|v| v.headline.trim().is_empty() || v.body.trim().is_empty())
        {
            return Err(PipelineError::SchemaValidation(format!(
                "copy variant {} has an empty headline or body",
                index + 1
            )));
        }
        Ok(ParsedCopy::Structured(payload.variants))
    }

    /// One request covering every core platform, validated into an export
    /// with exactly `count` entries per platform.
    #[instrument(skip(self, brief))]
    pub async fn generate_campaign_copy(
        &self,
        brief: &CreativeBrief,
        count: usize,
    ) -> Result<AdCopyExport, PipelineError> {
        let prompt = build_campaign_prompt(brief, count);
        let schema = campaign_schema(count);

        let outcome = self
            .policy
            .retry(
                "campaign_copy",
                |_attempt| {
                    let prompt = &prompt;
                    let schema = &schema;
                    async move {
                        let response = self
                            .client
                            .generate_text(prompt, Some(schema), &self.options)
                            .await?;
                        let export = AdCopyExport::from_json(&strip_code_fences(&response.text))?;
                        export.validate(count)?;
                        Ok(export)
                    }
                },
                is_retryable,
            )
            .await?;

        info!(attempts = outcome.attempts, "Campaign copy generated");
        Ok(outcome.value)
    }
}

pub fn build_prompt(request: &CopyRequest<'_>) -> String {
    let brief = request.brief;
    let platform = request.platform;
    let mut prompt = format!(
        "You are an expert performance marketer and copywriter.

Product: {product}
Target audience: {audience}
Platform: {platform}

Write exactly {count} distinct ad variations for {platform}.
Style for {platform}: {style}
",
        product = brief.product_description(),
        audience = brief.target_audience(),
        platform = platform,
        count = request.count,
        style = platform_style(platform),
    );

    if !request.angles.is_empty() {
        prompt.push_str("\nStrategic angle for each variation:\n");
        for i in 0..request.count {
            if let Some(angle) = request.angle_for(i) {
                prompt.push_str(&format!("{}. {}\n", i + 1, angle));
            }
        }
    }

    prompt.push_str(
        "\nEach variation needs a short headline and a persuasive body.
Return ONLY JSON in this schema: {\"variants\": [{\"headline\": \"...\", \"body\": \"...\"}]}.
If you cannot return JSON, write each variation on its own as:
Ad Copy: <headline and body>
Image Prompt: <a detailed visual description for the image generator>
",
    );
    prompt
}

pub fn build_campaign_prompt(brief: &CreativeBrief, count: usize) -> String {
    format!(
        "You are an expert performance marketer and copywriter.

Product: {product}
Target audience: {audience}

Generate exactly {count} short, punchy ad variations for each of the following platforms:
- Facebook
- Google
- TikTok

Style:
- Clear, persuasive, benefits-first.
- Keep each variation 1-3 sentences, no hashtags for Google; 0-2 tasteful hashtags for Facebook/TikTok.
- No markdown, no emojis for Google. Emojis allowed for Facebook/TikTok.

Return ONLY valid minified JSON with exactly the keys \"Facebook\", \"Google\" and \"TikTok\", \
each an array of {count} strings.",
        product = brief.product_description(),
        audience = brief.target_audience(),
        count = count,
    )
}

pub fn variants_schema(count: usize) -> ResponseSchema {
    ResponseSchema::new(
        VARIANTS_SCHEMA_NAME,
        json!({
            "type": "OBJECT",
            "properties": {
                "variants": {
                    "type": "ARRAY",
                    "minItems": count,
                    "maxItems": count,
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "headline": { "type": "STRING" },
                            "body": { "type": "STRING" }
                        },
                        "required": ["headline", "body"]
                    }
                }
            },
            "required": ["variants"]
        }),
    )
}

pub fn campaign_schema(count: usize) -> ResponseSchema {
    let list = json!({
        "type": "ARRAY",
        "items": { "type": "STRING" },
        "minItems": count,
        "maxItems": count
    });
    ResponseSchema::new(
        CAMPAIGN_SCHEMA_NAME,
        json!({
            "type": "OBJECT",
            "properties": {
                "Facebook": list.clone(),
                "Google": list.clone(),
                "TikTok": list
            },
            "required": ["Facebook", "Google", "TikTok"]
        }),
    )
}
