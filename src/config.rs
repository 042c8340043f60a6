//! Configuration System
//!
//! Layered configuration for backends, pipeline runs, output locations and
//! logging. Sources apply in this order, later ones winning key by key:
//!
//! 1. built-in defaults
//! 2. global file (`<XDG config dir>/adcraft/config.toml`)
//! 3. workspace `config/config.toml`, then `config/{ADCRAFT_ENV}.toml`
//! 4. an explicit file passed on the command line
//! 5. `ADCRAFT__SECTION__KEY` environment variables
//! 6. credential variables (`GEMINI_API_KEY` / `GOOGLE_API_KEY`,
//!    `GCP_PROJECT_ID`, `GCP_LOCATION`)

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::model::{CampaignGoal, Platform};
use crate::pipeline::{self, PipelineOptions};
use crate::provider::gemini::{
    DEFAULT_BASE_URL, DEFAULT_COMPOSE_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
};
use crate::provider::{GenerationOptions, GeminiSettings};
use crate::retry::RetryPolicy;
use crate::{composer, copywriter, image, strategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use sources::credentials::{API_KEY_VARS, LOCATION_VAR, PROJECT_ID_VAR};
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::workspace_config_files;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdcraftConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Normally supplied through `GEMINI_API_KEY` rather than a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_compose_model")]
    pub compose_model: String,

    /// Per-call bound, applied to HTTP requests and to every backend call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_compose_model() -> String {
    DEFAULT_COMPOSE_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            location: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            compose_model: default_compose_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("Invalid base_url '{}'", self.base_url));
        }
        for (name, model) in [
            ("text_model", &self.text_model),
            ("image_model", &self.image_model),
            ("compose_model", &self.compose_model),
        ] {
            if model.trim().is_empty() {
                return Err(format!("{} cannot be empty", name));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
            compose_model: self.compose_model.clone(),
            request_timeout: self.request_timeout(),
        }
    }
}

/// Run defaults; command-line flags override individual fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,

    #[serde(default = "default_variations")]
    pub variations_per_platform: usize,

    #[serde(default)]
    pub goal: CampaignGoal,

    #[serde(default = "default_true")]
    pub compose: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<PathBuf>,

    #[serde(default = "default_concurrency")]
    pub max_concurrent_slots: usize,

    #[serde(default = "default_strategy_attempts")]
    pub strategy_attempts: u32,

    #[serde(default = "default_copy_attempts")]
    pub copy_attempts: u32,

    /// Seconds between retry attempts
    #[serde(default)]
    pub retry_delay_secs: u64,

    #[serde(default = "default_retry_max_elapsed_secs")]
    pub retry_max_elapsed_secs: u64,

    /// Sampling temperature for copy; the backend default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_temperature: Option<f32>,
}

fn default_platforms() -> Vec<String> {
    Platform::core().iter().map(|p| p.as_str().to_string()).collect()
}

fn default_variations() -> usize {
    copywriter::DEFAULT_VARIATIONS
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

fn default_strategy_attempts() -> u32 {
    strategy::DEFAULT_MAX_ATTEMPTS
}

fn default_copy_attempts() -> u32 {
    copywriter::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_max_elapsed_secs() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            variations_per_platform: default_variations(),
            goal: CampaignGoal::default(),
            compose: default_true(),
            base_image: None,
            max_concurrent_slots: default_concurrency(),
            strategy_attempts: default_strategy_attempts(),
            copy_attempts: default_copy_attempts(),
            retry_delay_secs: 0,
            retry_max_elapsed_secs: default_retry_max_elapsed_secs(),
            copy_temperature: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.platforms.is_empty() {
            return Err("At least one platform is required".to_string());
        }
        if self.platforms.iter().any(|p| p.trim().is_empty()) {
            return Err("Platform names cannot be empty".to_string());
        }
        if let Ok(platforms) = self.platforms() {
            if let Some(platform) = pipeline::duplicate_platform(&platforms) {
                return Err(format!("Platform {} is listed more than once", platform));
            }
        }
        if self.variations_per_platform == 0 {
            return Err("variations_per_platform must be greater than 0".to_string());
        }
        if self.max_concurrent_slots == 0 {
            return Err("max_concurrent_slots must be greater than 0".to_string());
        }
        if self.strategy_attempts == 0 || self.copy_attempts == 0 {
            return Err("Retry attempts must be greater than 0".to_string());
        }
        if let Some(temperature) = self.copy_temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "copy_temperature {} is outside 0.0..=2.0",
                    temperature
                ));
            }
        }
        Ok(())
    }

    pub fn platforms(&self) -> Result<Vec<Platform>, PipelineError> {
        self.platforms.iter().map(|name| name.parse()).collect()
    }

    pub fn strategy_policy(&self) -> RetryPolicy {
        self.policy(self.strategy_attempts)
    }

    pub fn copy_policy(&self) -> RetryPolicy {
        self.policy(self.copy_attempts)
    }

    pub fn copy_options(&self) -> GenerationOptions {
        match self.copy_temperature {
            Some(temperature) => GenerationOptions::with_temperature(temperature),
            None => GenerationOptions::default(),
        }
    }

    /// Options for a run; `run_id` is left for the orchestrator to generate.
    pub fn options(&self) -> Result<PipelineOptions, PipelineError> {
        Ok(PipelineOptions {
            platforms: self.platforms()?,
            variations_per_platform: self.variations_per_platform,
            goal: self.goal,
            compose: self.compose,
            base_image: self.base_image.clone(),
            max_concurrent_slots: self.max_concurrent_slots,
            run_id: None,
        })
    }

    fn policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
            max_elapsed: Duration::from_secs(self.retry_max_elapsed_secs),
        }
    }
}

/// Where generated files land, relative to the workspace unless absolute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    #[serde(default = "default_ads_dir")]
    pub ads_dir: PathBuf,

    /// Base image for single-shot composition
    #[serde(default = "default_base_image")]
    pub default_base_image: PathBuf,

    #[serde(default = "default_slug_max_len")]
    pub slug_max_len: usize,
}

fn default_images_dir() -> PathBuf {
    PathBuf::from(image::DEFAULT_IMAGES_DIR)
}

fn default_ads_dir() -> PathBuf {
    PathBuf::from(composer::DEFAULT_ADS_DIR)
}

fn default_base_image() -> PathBuf {
    PathBuf::from(composer::DEFAULT_BASE_IMAGE)
}

fn default_slug_max_len() -> usize {
    image::DEFAULT_SLUG_MAX_LEN
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            ads_dir: default_ads_dir(),
            default_base_image: default_base_image(),
            slug_max_len: default_slug_max_len(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.images_dir.as_os_str().is_empty() {
            return Err("images_dir cannot be empty".to_string());
        }
        if self.ads_dir.as_os_str().is_empty() {
            return Err("ads_dir cannot be empty".to_string());
        }
        if self.slug_max_len == 0 {
            return Err("slug_max_len must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Output locations with relative paths anchored at `workspace_root`.
    pub fn resolved(&self, workspace_root: &Path) -> OutputConfig {
        let anchor = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                workspace_root.join(path)
            }
        };
        OutputConfig {
            images_dir: anchor(&self.images_dir),
            ads_dir: anchor(&self.ads_dir),
            default_base_image: anchor(&self.default_base_image),
            slug_max_len: self.slug_max_len,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Backend(String),
    Pipeline(String),
    Output(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl AdcraftConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }
        if let Err(e) = self.pipeline.validate() {
            errors.push(ValidationError::Pipeline(e));
        }
        if let Err(e) = self.pipeline.platforms() {
            errors.push(ValidationError::Pipeline(e.to_string()));
        }
        if let Err(e) = self.output.validate() {
            errors.push(ValidationError::Output(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into one `Config` error.
    pub fn ensure_valid(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }

    /// Fails when the credentials a live backend needs are absent, naming
    /// the variables to set.
    pub fn require_credentials(&self) -> Result<(), PipelineError> {
        let has_key = self
            .backend
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if has_key {
            return Ok(());
        }
        Err(PipelineError::Config(format!(
            "Missing required environment variables: {}",
            API_KEY_VARS.join(" or ")
        )))
    }
}

/// Builds an [`AdcraftConfig`] from every layered source.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace_root: PathBuf,
    explicit_file: Option<PathBuf>,
    global_file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            explicit_file: None,
            global_file: global_config_path(),
            env: None,
        }
    }

    /// A file layered above the workspace files. It must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Replace the global file location; `None` skips the global layer.
    pub fn with_global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global_file = path;
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    /// Profile selecting `config/{profile}.toml`.
    pub fn profile(&self) -> String {
        self.var("ADCRAFT_ENV")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| sources::workspace_file::DEFAULT_PROFILE.to_string())
    }

    pub fn load(&self) -> Result<AdcraftConfig, PipelineError> {
        if let Some(path) = &self.explicit_file {
            if !path.is_file() {
                return Err(PipelineError::MissingResource {
                    kind: "Config file",
                    path: path.clone(),
                });
            }
        }

        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder, self.global_file.as_deref())?;
        builder =
            sources::workspace_file::add_to_builder(builder, &self.workspace_root, &self.profile())?;
        if let Some(path) = &self.explicit_file {
            builder = builder.add_source(config::File::from(path.clone()).required(true));
        }
        let env_vars = self
            .env
            .as_ref()
            .map(|vars| vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        builder = sources::environment::add_to_builder(builder, env_vars)?;
        builder = sources::credentials::add_to_builder(builder, &|name| self.var(name))?;

        let config: AdcraftConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}
