//! Ad composition: merge copy onto an existing base image.

use crate::error::PipelineError;
use crate::provider::{GenerationClient, ImageData};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_BASE_IMAGE: &str = "images/image.png";
pub const DEFAULT_ADS_DIR: &str = "ads";

pub struct AdComposer {
    client: Arc<GenerationClient>,
    output_dir: PathBuf,
    default_base_image: PathBuf,
}

impl AdComposer {
    pub fn new(client: Arc<GenerationClient>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            default_base_image: PathBuf::from(DEFAULT_BASE_IMAGE),
        }
    }

    pub fn with_default_base_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_base_image = path.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Compose `ad_copy` onto `base_image` (or the default base image) and
    /// save it as `<output_dir>/<file name of output_filename>`. A missing
    /// base image is reported before any backend call.
    #[instrument(skip(self, ad_copy), fields(output = %output_filename))]
    pub async fn compose(
        &self,
        ad_copy: &str,
        base_image: Option<&Path>,
        output_filename: &str,
    ) -> Result<PathBuf, PipelineError> {
        let base_image = base_image.unwrap_or(&self.default_base_image);
        if !base_image.is_file() {
            return Err(PipelineError::MissingResource {
                kind: "Base image",
                path: base_image.to_path_buf(),
            });
        }
        let file_name = Path::new(output_filename)
            .file_name()
            .ok_or_else(|| {
                PipelineError::Config(format!("Invalid output file name: {}", output_filename))
            })?
            .to_owned();

        let reference = ImageData {
            bytes: tokio::fs::read(base_image).await?,
            mime_type: mime_type_for(base_image).to_string(),
        };
        let response = self
            .client
            .compose_image(&build_prompt(ad_copy), reference)
            .await?;
        let image = response.images.into_iter().next().ok_or_else(|| {
            PipelineError::EmptyResult("no image data found in the response".to_string())
        })?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_path = self.output_dir.join(file_name);
        tokio::fs::write(&output_path, &image.bytes).await?;
        info!(path = %output_path.display(), "Composed creative saved");
        Ok(output_path)
    }
}

/// Default single-shot output name, e.g. `facebook_ad.png`.
pub fn default_output_filename(platform: &crate::model::Platform) -> String {
    format!("{}_ad.png", platform.slug())
}

pub fn build_prompt(ad_copy: &str) -> String {
    format!(
        "Create an advertising image that incorporates this ad copy: \"{}\"

Please enhance or modify the provided image to create a compelling advertisement that:
- Includes the ad copy text in an attractive, readable format
- Maintains good visual composition and brand appeal
- Uses appropriate typography and layout for advertising
- Ensures the text complements rather than overwhelms the image",
        ad_copy.trim()
    )
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
