//! Visual prompt synthesis: ad copy in, one image-generator paragraph out.

use crate::error::PipelineError;
use crate::model::{CampaignGoal, CreativeBrief, Platform};
use crate::provider::{strip_code_fences, GenerationClient, GenerationOptions};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Target length of a visual prompt, in words.
pub const TARGET_WORDS: RangeInclusive<usize> = 80..=160;

/// Composition guidance per platform. Unknown platforms get none.
pub fn platform_guidelines(platform: &Platform) -> &'static str {
    match platform {
        Platform::Facebook => {
            "- Composition: product hero centered, lifestyle context, friendly human presence when appropriate.
- Framing: square-like framing; think \"works well as 1:1\". Clear focal point.
- Text in image: avoid embedded text; rely on visuals.
- Vibe: warm, inviting, authentic; real-world usage; subtle brand feel."
        }
        Platform::Google => {
            "- Composition: clean, minimalist product-centric laydown on a tidy background.
- Framing: think \"works well as 1200x628 landscape banner\"; ample negative space.
- Text in image: none.
- Vibe: crisp, polished, high-clarity e-commerce product visual."
        }
        Platform::TikTok => {
            "- Composition: vertical storytelling moment; dynamic, human-in-action scene.
- Framing: think \"works well as 9:16\"; subject large, energetic motion or expressive emotion.
- Text in image: avoid; keep visual clean.
- Vibe: fun, high-energy, modern social-video aesthetic with cinematic lighting."
        }
        Platform::Other(_) => "",
    }
}

/// Inputs for one visual prompt.
#[derive(Debug, Clone, Copy)]
pub struct VisualRequest<'a> {
    pub ad_copy: &'a str,
    pub brief: &'a CreativeBrief,
    pub platform: &'a Platform,
    pub goal: CampaignGoal,
    /// Visual direction suggested alongside free-text copy.
    pub image_prompt_hint: Option<&'a str>,
}

pub struct VisualPromptSynthesizer {
    client: Arc<GenerationClient>,
    options: GenerationOptions,
}

impl VisualPromptSynthesizer {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Produce one paragraph. Lengths outside [`TARGET_WORDS`] are accepted
    /// with a warning; an empty paragraph is an error.
    #[instrument(skip(self, request), fields(platform = %request.platform, goal = %request.goal))]
    pub async fn synthesize(&self, request: &VisualRequest<'_>) -> Result<String, PipelineError> {
        let prompt = build_prompt(request);
        let response = self.client.generate_text(&prompt, None, &self.options).await?;
        let paragraph = normalize_paragraph(&response.text);
        if paragraph.is_empty() {
            return Err(PipelineError::EmptyResult(
                "visual prompt was empty".to_string(),
            ));
        }

        let words = word_count(&paragraph);
        if !TARGET_WORDS.contains(&words) {
            warn!(
                words,
                min = TARGET_WORDS.start(),
                max = TARGET_WORDS.end(),
                "Visual prompt outside target length"
            );
        } else {
            debug!(words, "Visual prompt ready");
        }
        Ok(paragraph)
    }
}

pub fn build_prompt(request: &VisualRequest<'_>) -> String {
    let mut prompt = format!(
        "Turn the following ad copy into a single, precise visual description for an image generator.
The goal is to convey what the image should look like (objects, scene, colors, mood, lighting, camera framing).
No camera brands, no celebrity likeness, no trademarks, no text overlays.

Product: {product}
Audience: {audience}
Marketing goal: {goal}
Platform: {platform}
Platform-specific visual guidelines:
{guidelines}

Ad copy:
\"\"\"{copy}\"\"\"
",
        product = request.brief.product_description(),
        audience = request.brief.target_audience(),
        goal = request.goal,
        platform = request.platform,
        guidelines = platform_guidelines(request.platform),
        copy = request.ad_copy.trim(),
    );
    if let Some(hint) = request.image_prompt_hint.filter(|h| !h.trim().is_empty()) {
        prompt.push_str(&format!("\nSuggested visual direction: {}\n", hint.trim()));
    }
    prompt.push_str(
        "
Write the final prompt as one paragraph, 80-160 words, covering:
- Subject(s) and actions
- Clear product placement and details
- Setting and props
- Lighting, color palette, mood
- Composition that fits the platform guidance above
Return ONLY the paragraph (no preface, no bullets, no markdown).
",
    );
    prompt
}

/// Strip code fences and collapse all whitespace into a single paragraph.
pub fn normalize_paragraph(raw: &str) -> String {
    strip_code_fences(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
