use crate::error::PipelineError;
use crate::model::brief::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Number of strategic angles produced per brief, fallback included.
pub const STRATEGIC_PROMPT_COUNT: usize = 5;

/// One (platform, variation) unit of work. `variation` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotRef {
    pub platform: Platform,
    pub variation: usize,
}

impl SlotRef {
    pub fn new(platform: Platform, variation: usize) -> Self {
        Self {
            platform,
            variation,
        }
    }

    /// Basename used for the slot's generated image, e.g. `facebook-1`.
    pub fn image_basename(&self) -> String {
        format!("{}-{}", self.platform.slug(), self.variation + 1)
    }

    /// File name used for the slot's composed creative, e.g. `facebook_ad_1.png`.
    pub fn composed_filename(&self) -> String {
        format!("{}_ad_{}.png", self.platform.slug(), self.variation + 1)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.platform, self.variation + 1)
    }
}

/// Pipeline stage a slot failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Copy,
    VisualPrompt,
    Image,
    Compose,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Copy => "copy",
            Stage::VisualPrompt => "visual_prompt",
            Stage::Image => "image",
            Stage::Compose => "compose",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly [`STRATEGIC_PROMPT_COUNT`] non-blank angle directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct StrategicPrompts(Vec<String>);

impl StrategicPrompts {
    /// Build from a fixed, known-good set of angles.
    pub(crate) fn from_static(prompts: [&str; STRATEGIC_PROMPT_COUNT]) -> Self {
        Self(prompts.iter().map(|p| p.to_string()).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Angle assigned to variation `index`, round-robin.
    pub fn angle_for(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }
}

impl TryFrom<Vec<String>> for StrategicPrompts {
    type Error = PipelineError;

    fn try_from(prompts: Vec<String>) -> Result<Self, Self::Error> {
        if prompts.len() != STRATEGIC_PROMPT_COUNT {
            return Err(PipelineError::SchemaValidation(format!(
                "expected exactly {} strategic prompts, got {}",
                STRATEGIC_PROMPT_COUNT,
                prompts.len()
            )));
        }
        let trimmed: Vec<String> = prompts.into_iter().map(|p| p.trim().to_string()).collect();
        if let Some(index) = trimmed.iter().position(String::is_empty) {
            return Err(PipelineError::SchemaValidation(format!(
                "strategic prompt {} is empty",
                index + 1
            )));
        }
        Ok(Self(trimmed))
    }
}

impl From<StrategicPrompts> for Vec<String> {
    fn from(prompts: StrategicPrompts) -> Self {
        prompts.0
    }
}

/// Ad copy for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    pub slot: SlotRef,
    pub headline: String,
    pub body: String,
    /// Exact prompt that produced this copy.
    pub generation_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_angle: Option<String>,
    /// Visual direction the backend suggested alongside free-text copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt_hint: Option<String>,
}

impl AdCopy {
    /// Split free text into headline and body. The first line is the headline
    /// when the text spans several lines, otherwise the first sentence is.
    pub fn from_text(slot: SlotRef, text: &str, generation_prompt: impl Into<String>) -> Self {
        let text = text.trim();
        let (headline, body) = match text.split_once('\n') {
            Some((first, rest)) => (first.trim().to_string(), rest.trim().to_string()),
            None => split_first_sentence(text),
        };
        Self {
            slot,
            headline,
            body,
            generation_prompt: generation_prompt.into(),
            strategic_angle: None,
            image_prompt_hint: None,
        }
    }

    /// Headline and body as one string, as exported and handed to later stages.
    pub fn full_text(&self) -> String {
        match (self.headline.is_empty(), self.body.is_empty()) {
            (true, _) => self.body.clone(),
            (false, true) => self.headline.clone(),
            (false, false) => format!("{}\n{}", self.headline, self.body),
        }
    }
}

fn split_first_sentence(text: &str) -> (String, String) {
    let boundary = text
        .char_indices()
        .find(|(i, c)| {
            matches!(c, '.' | '!' | '?')
                && text[i + c.len_utf8()..].starts_with(char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8());
    match boundary {
        Some(end) => (text[..end].trim().to_string(), text[end..].trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// Generated image persisted for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub slot: SlotRef,
    pub image_path: PathBuf,
    /// Visual prompt handed to the image backend.
    pub generation_prompt: String,
}

/// Final creative: copy and image merged into one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCreative {
    pub slot: SlotRef,
    pub ad_copy: AdCopy,
    pub raw_image: RawImage,
    pub composed_image_path: PathBuf,
    #[serde(default)]
    pub quality_score: Option<u8>,
    #[serde(default)]
    pub performance_metrics: Option<HashMap<String, f64>>,
}

/// A contained per-slot failure with enough context to localize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFailure {
    pub slot: SlotRef,
    pub stage: Stage,
    pub message: String,
}

impl SlotFailure {
    pub fn new(slot: SlotRef, stage: Stage, error: &PipelineError) -> Self {
        Self {
            slot,
            stage,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for SlotFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.slot, self.stage, self.message)
    }
}
