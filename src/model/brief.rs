use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Advertising platform. Known platforms get dedicated style and composition
/// rules; any other name is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    Facebook,
    Google,
    TikTok,
    Other(String),
}

impl Platform {
    /// Platforms covered by a default run and by the copy export, in export order.
    pub fn core() -> Vec<Platform> {
        vec![Platform::Facebook, Platform::Google, Platform::TikTok]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Google => "Google",
            Platform::TikTok => "TikTok",
            Platform::Other(name) => name,
        }
    }

    /// Lowercase form used in file names.
    pub fn slug(&self) -> String {
        self.as_str().to_lowercase().replace(char::is_whitespace, "-")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err(PipelineError::InvalidBrief(
                "Platform name cannot be empty".to_string(),
            )),
            "facebook" => Ok(Platform::Facebook),
            "google" | "google ads" => Ok(Platform::Google),
            "tiktok" => Ok(Platform::TikTok),
            _ => Ok(Platform::Other(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

/// Marketing goal for a campaign; steers the visual prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignGoal {
    #[default]
    Awareness,
    Consideration,
    Conversion,
}

impl CampaignGoal {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignGoal::Awareness => "Awareness",
            CampaignGoal::Consideration => "Consideration",
            CampaignGoal::Conversion => "Conversion",
        }
    }
}

impl fmt::Display for CampaignGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignGoal {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awareness" => Ok(CampaignGoal::Awareness),
            "consideration" => Ok(CampaignGoal::Consideration),
            "conversion" => Ok(CampaignGoal::Conversion),
            other => Err(PipelineError::Config(format!(
                "Invalid campaign goal: {} (must be awareness, consideration, or conversion)",
                other
            ))),
        }
    }
}

/// The seed of every downstream artifact. Fields are private so a brief
/// cannot change after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeBrief {
    product_description: String,
    target_audience: String,
    platform: Platform,
}

impl CreativeBrief {
    pub fn new(
        product_description: impl Into<String>,
        target_audience: impl Into<String>,
        platform: Platform,
    ) -> Result<Self, PipelineError> {
        let product_description = product_description.into().trim().to_string();
        let target_audience = target_audience.into().trim().to_string();
        if product_description.is_empty() {
            return Err(PipelineError::InvalidBrief(
                "Product description cannot be empty".to_string(),
            ));
        }
        if target_audience.is_empty() {
            return Err(PipelineError::InvalidBrief(
                "Target audience cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            product_description,
            target_audience,
            platform,
        })
    }

    pub fn product_description(&self) -> &str {
        &self.product_description
    }

    pub fn target_audience(&self) -> &str {
        &self.target_audience
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}
