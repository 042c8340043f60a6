//! Image generation and persistence.
//!
//! Every outcome is a typed `Result`: backend, safety, timeout and I/O errors
//! are returned, and a panic inside generation is caught at this boundary.

use crate::error::PipelineError;
use crate::provider::GenerationClient;
use futures::FutureExt;
use std::any::Any;
use std::io::ErrorKind;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_IMAGES_DIR: &str = "generated";
pub const DEFAULT_SLUG_MAX_LEN: usize = 40;
const SUFFIX_LEN: usize = 8;
const MAX_NAME_ATTEMPTS: usize = 8;

/// File-name-safe slug: lowercase alphanumerics, with spaces, hyphens and
/// underscores folded into single hyphens and everything else dropped.
/// Never empty and never longer than `max_len`.
pub fn safe_slug(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if matches!(ch, ' ' | '-' | '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let truncated: String = slug.trim_matches('-').chars().take(max_len).collect();
    let trimmed = truncated.trim_matches('-');
    if trimmed.is_empty() {
        "image".chars().take(max_len.max(1)).collect()
    } else {
        trimmed.to_string()
    }
}

fn random_suffix() -> String {
    let mut suffix = uuid::Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct ImageGenerator {
    client: Arc<GenerationClient>,
    output_dir: PathBuf,
    slug_max_len: usize,
}

impl ImageGenerator {
    pub fn new(client: Arc<GenerationClient>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            slug_max_len: DEFAULT_SLUG_MAX_LEN,
        }
    }

    pub fn with_slug_max_len(mut self, max_len: usize) -> Self {
        self.slug_max_len = max_len;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate one image for `prompt` and save it as
    /// `<output_dir>/<slug>-<8 hex>.png`, slugging `basename` when given and
    /// the prompt otherwise.
    #[instrument(skip_all, fields(basename = basename.unwrap_or("")))]
    pub async fn generate(
        &self,
        prompt: &str,
        basename: Option<&str>,
    ) -> Result<PathBuf, PipelineError> {
        let start = Instant::now();
        let result = AssertUnwindSafe(self.generate_inner(prompt, basename))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(PipelineError::Internal(format!(
                    "image generation panicked: {}",
                    panic_message(payload)
                )))
            });
        match &result {
            Ok(path) => info!(
                path = %path.display(),
                duration_ms = start.elapsed().as_millis(),
                "Image saved"
            ),
            Err(err) => warn!(error = %err, "Image generation failed"),
        }
        result
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        basename: Option<&str>,
    ) -> Result<PathBuf, PipelineError> {
        let response = self.client.generate_images(prompt, 1).await?;
        let image = response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::EmptyResult("no images generated".to_string()))?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let slug = safe_slug(basename.unwrap_or(prompt), self.slug_max_len);
        self.write_unique(&slug, &image.bytes).await
    }

    /// Create `<slug>-<suffix>.png` with create-new semantics, drawing a
    /// fresh suffix when the name is taken.
    async fn write_unique(&self, slug: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self
                .output_dir
                .join(format!("{}-{}.png", slug, random_suffix()));
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Image name taken, drawing a new suffix");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(PipelineError::Internal(format!(
            "could not find a free file name for '{}'",
            slug
        )))
    }
}
