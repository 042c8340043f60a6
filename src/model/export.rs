use crate::error::PipelineError;
use crate::model::brief::Platform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Platform → ordered ad copy strings, persisted as `ads.json`.
///
/// Serialized with exactly the keys `"Facebook"`, `"Google"` and `"TikTok"`;
/// unknown keys are rejected on parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdCopyExport {
    #[serde(rename = "Facebook")]
    pub facebook: Vec<String>,
    #[serde(rename = "Google")]
    pub google: Vec<String>,
    #[serde(rename = "TikTok")]
    pub tiktok: Vec<String>,
}

impl AdCopyExport {
    /// Copy list for a core platform; `None` for platforms outside the export.
    pub fn get(&self, platform: &Platform) -> Option<&Vec<String>> {
        match platform {
            Platform::Facebook => Some(&self.facebook),
            Platform::Google => Some(&self.google),
            Platform::TikTok => Some(&self.tiktok),
            Platform::Other(_) => None,
        }
    }

    /// Append copy for `platform`. Returns false for platforms outside the export.
    pub fn push(&mut self, platform: &Platform, text: String) -> bool {
        match platform {
            Platform::Facebook => self.facebook.push(text),
            Platform::Google => self.google.push(text),
            Platform::TikTok => self.tiktok.push(text),
            Platform::Other(_) => return false,
        }
        true
    }

    /// Check every platform carries exactly `count` non-blank entries.
    pub fn validate(&self, count: usize) -> Result<(), PipelineError> {
        for platform in Platform::core() {
            let entries = self.get(&platform).map(Vec::as_slice).unwrap_or_default();
            if entries.len() != count {
                return Err(PipelineError::SchemaValidation(format!(
                    "{} has {} ad variations, expected {}",
                    platform,
                    entries.len(),
                    count
                )));
            }
            if entries.iter().any(|entry| entry.trim().is_empty()) {
                return Err(PipelineError::SchemaValidation(format!(
                    "{} contains an empty ad variation",
                    platform
                )));
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, PipelineError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Internal(format!("Failed to serialize export: {}", e)))
    }

    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(raw).map_err(|e| PipelineError::SchemaValidation(e.to_string()))
    }

    /// Write the export as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingResource {
                kind: "Export file",
                path: path.to_path_buf(),
            });
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
