//! Pipeline orchestration: strategies, then per-platform copy, then per-slot
//! visual prompt, image and composition.
//!
//! A slot is one (platform, variation) pair. Stage failures are contained to
//! their slot and recorded in [`PipelineState::failures`]; only configuration
//! problems and a failed strategy expansion abort a run.

pub mod progress;
pub mod summary;

pub use progress::{LoggingObserver, PipelineEvent, ProgressObserver, ProgressTracker};

use crate::composer::{AdComposer, DEFAULT_ADS_DIR};
use crate::copywriter::{CopyGenerator, CopyRequest, DEFAULT_VARIATIONS};
use crate::error::PipelineError;
use crate::image::{ImageGenerator, DEFAULT_IMAGES_DIR};
use crate::model::{
    AdCopy, AdCreative, CampaignGoal, CreativeBrief, PipelineState, Platform, RawImage,
    SlotFailure, SlotOutcome, SlotRef, Stage,
};
use crate::provider::{GenerationClient, GenerationOptions};
use crate::retry::RetryPolicy;
use crate::strategy::StrategicPromptExpander;
use crate::visual::{VisualPromptSynthesizer, VisualRequest};
use futures::stream::{self, StreamExt};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Run-level knobs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub platforms: Vec<Platform>,
    pub variations_per_platform: usize,
    pub goal: CampaignGoal,
    /// Compose copy onto each generated image.
    pub compose: bool,
    /// Compose onto this image instead of each slot's generated image.
    pub base_image: Option<PathBuf>,
    pub max_concurrent_slots: usize,
    /// Name of the composed-output subdirectory; generated when absent.
    pub run_id: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            platforms: Platform::core(),
            variations_per_platform: DEFAULT_VARIATIONS,
            goal: CampaignGoal::default(),
            compose: true,
            base_image: None,
            max_concurrent_slots: 1,
            run_id: None,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.platforms.is_empty() {
            return Err(PipelineError::Config(
                "At least one platform is required".to_string(),
            ));
        }
        if self.variations_per_platform == 0 {
            return Err(PipelineError::Config(
                "variations_per_platform must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_slots == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_slots must be greater than 0".to_string(),
            ));
        }
        if let Some(platform) = duplicate_platform(&self.platforms) {
            return Err(PipelineError::Config(format!(
                "Platform {} is listed more than once",
                platform
            )));
        }
        if let Some(run_id) = &self.run_id {
            validate_run_id(run_id)?;
        }
        Ok(())
    }

    pub fn total_slots(&self) -> usize {
        self.platforms.len() * self.variations_per_platform
    }
}

/// First platform that appears twice; slots are keyed by platform and variation.
pub fn duplicate_platform(platforms: &[Platform]) -> Option<&Platform> {
    platforms
        .iter()
        .enumerate()
        .find(|(i, platform)| platforms[..*i].contains(platform))
        .map(|(_, platform)| platform)
}

/// A run id names one directory directly under the ads directory.
fn validate_run_id(run_id: &str) -> Result<(), PipelineError> {
    let mut components = Path::new(run_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !run_id.contains(['/', '\\']) => Ok(()),
        _ => Err(PipelineError::Config(format!(
            "run_id '{}' must be a single directory name",
            run_id
        ))),
    }
}

/// Copy stage result for one slot, ready for the per-slot stages.
struct SlotJob {
    slot: SlotRef,
    copy: Result<AdCopy, SlotFailure>,
}

pub struct PipelineOrchestrator {
    client: Arc<GenerationClient>,
    expander: StrategicPromptExpander,
    copywriter: CopyGenerator,
    visual: VisualPromptSynthesizer,
    images: ImageGenerator,
    ads_dir: PathBuf,
    options: PipelineOptions,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl PipelineOrchestrator {
    pub fn new(client: Arc<GenerationClient>, options: PipelineOptions) -> Self {
        Self {
            expander: StrategicPromptExpander::new(client.clone()),
            copywriter: CopyGenerator::new(client.clone()),
            visual: VisualPromptSynthesizer::new(client.clone()),
            images: ImageGenerator::new(client.clone(), DEFAULT_IMAGES_DIR),
            ads_dir: PathBuf::from(DEFAULT_ADS_DIR),
            client,
            options,
            observers: vec![Arc::new(LoggingObserver)],
        }
    }

    pub fn with_output_dirs(mut self, images_dir: impl Into<PathBuf>, ads_dir: impl Into<PathBuf>) -> Self {
        self.images = ImageGenerator::new(self.client.clone(), images_dir);
        self.ads_dir = ads_dir.into();
        self
    }

    pub fn with_image_generator(mut self, images: ImageGenerator) -> Self {
        self.images = images;
        self
    }

    pub fn with_strategy_policy(mut self, policy: RetryPolicy) -> Self {
        self.expander = self.expander.with_policy(policy);
        self
    }

    pub fn with_copy_policy(mut self, policy: RetryPolicy) -> Self {
        self.copywriter = self.copywriter.with_policy(policy);
        self
    }

    pub fn with_copy_options(mut self, options: GenerationOptions) -> Self {
        self.copywriter = self.copywriter.with_options(options);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage for every slot of `brief`.
    #[instrument(skip(self, brief), fields(product = %brief.product_description()))]
    pub async fn run(&self, brief: CreativeBrief) -> Result<PipelineState, PipelineError> {
        let start = Instant::now();
        self.options.validate()?;
        self.client.ensure_initialized().await?;

        let run_id = self.options.run_id.clone().unwrap_or_else(new_run_id);
        let total = self.options.total_slots();
        let tracker = ProgressTracker::new(total, self.observers.clone());
        tracker.emit(PipelineEvent::RunStarted {
            run_id: run_id.clone(),
            total_slots: total,
        });

        let mut state = PipelineState::new(brief);
        state.run_id = run_id.clone();

        let strategies = self.expander.expand(&state.brief).await?;
        tracker.emit(PipelineEvent::StrategiesReady {
            count: strategies.prompts.len(),
            attempts: strategies.attempts,
            used_fallback: strategies.used_fallback,
        });
        state.strategies_used_fallback = strategies.used_fallback;

        let jobs = self
            .generate_copy(&state.brief, strategies.prompts.as_slice(), &tracker)
            .await;
        state.strategic_prompts = Some(strategies.prompts);

        let composer = self
            .options
            .compose
            .then(|| AdComposer::new(self.client.clone(), self.ads_dir.join(&run_id)));
        let brief = &state.brief;
        let tracker_ref = &tracker;
        let composer_ref = composer.as_ref();

        let mut outcomes: Vec<(usize, SlotOutcome)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let outcome = self.run_slot(job, brief, composer_ref).await;
                tracker_ref.complete_slot(&outcome.slot, outcome.failure.as_ref());
                (index, outcome)
            })
            .buffer_unordered(self.options.max_concurrent_slots)
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        for (_, outcome) in outcomes {
            state.record_slot(outcome);
        }
        state.final_recommendation = Some(summary::recommendation(&state));

        let failed = state.failures.len();
        tracker.emit(PipelineEvent::RunCompleted {
            run_id,
            succeeded: state.slot_count() - failed,
            failed,
            duration_ms: start.elapsed().as_millis() as u64,
        });
        Ok(state)
    }

    /// Copy for every platform, flattened into slot order. A failed request
    /// becomes a copy-stage failure for each of that platform's slots.
    async fn generate_copy(
        &self,
        brief: &CreativeBrief,
        angles: &[String],
        tracker: &ProgressTracker,
    ) -> Vec<SlotJob> {
        let count = self.options.variations_per_platform;
        let mut jobs = Vec::with_capacity(self.options.total_slots());
        for platform in &self.options.platforms {
            let request = CopyRequest::new(brief, platform, count).with_angles(angles);
            let results = self.copywriter.generate(&request).await;
            let before = jobs.len();
            match results {
                Ok(results) => {
                    for (variation, result) in results.into_iter().enumerate() {
                        let slot = SlotRef::new(platform.clone(), variation);
                        let copy = result.map_err(|err| SlotFailure::new(slot.clone(), Stage::Copy, &err));
                        jobs.push(SlotJob { slot, copy });
                    }
                }
                Err(err) => {
                    for variation in 0..count {
                        let slot = SlotRef::new(platform.clone(), variation);
                        let failure = SlotFailure::new(slot.clone(), Stage::Copy, &err);
                        jobs.push(SlotJob {
                            slot,
                            copy: Err(failure),
                        });
                    }
                }
            }
            let failed = jobs[before..].iter().filter(|job| job.copy.is_err()).count();
            tracker.emit(PipelineEvent::CopyGenerated {
                platform: platform.clone(),
                produced: jobs.len() - before - failed,
                failed,
            });
        }
        jobs
    }

    async fn run_slot(
        &self,
        job: SlotJob,
        brief: &CreativeBrief,
        composer: Option<&AdComposer>,
    ) -> SlotOutcome {
        let mut outcome = SlotOutcome::empty(job.slot.clone());
        let slot = job.slot;
        let copy = match job.copy {
            Ok(copy) => copy,
            Err(failure) => {
                outcome.failure = Some(failure);
                return outcome;
            }
        };
        let copy_text = copy.full_text();
        outcome.copy = Some(copy.clone());

        let visual_request = VisualRequest {
            ad_copy: &copy_text,
            brief,
            platform: &slot.platform,
            goal: self.options.goal,
            image_prompt_hint: copy.image_prompt_hint.as_deref(),
        };
        let visual_prompt = match self.visual.synthesize(&visual_request).await {
            Ok(prompt) => prompt,
            Err(err) => return fail(outcome, Stage::VisualPrompt, &err),
        };
        outcome.visual_prompt = Some(visual_prompt.clone());

        let image_path = match self
            .images
            .generate(&visual_prompt, Some(&slot.image_basename()))
            .await
        {
            Ok(path) => path,
            Err(err) => return fail(outcome, Stage::Image, &err),
        };
        let raw_image = RawImage {
            slot: slot.clone(),
            image_path,
            generation_prompt: visual_prompt,
        };
        outcome.image = Some(raw_image.clone());

        let Some(composer) = composer else {
            return outcome;
        };
        let base_image = self
            .options
            .base_image
            .as_deref()
            .unwrap_or(raw_image.image_path.as_path());
        match composer
            .compose(&copy_text, Some(base_image), &slot.composed_filename())
            .await
        {
            Ok(composed_image_path) => {
                info!(slot = %slot, path = %composed_image_path.display(), "Creative composed");
                outcome.creative = Some(AdCreative {
                    slot,
                    ad_copy: copy,
                    raw_image,
                    composed_image_path,
                    quality_score: None,
                    performance_metrics: None,
                });
                outcome
            }
            Err(err) => fail(outcome, Stage::Compose, &err),
        }
    }
}

fn fail(mut outcome: SlotOutcome, stage: Stage, err: &PipelineError) -> SlotOutcome {
    outcome.failure = Some(SlotFailure::new(outcome.slot.clone(), stage, err));
    outcome
}

/// Timestamp plus a short random suffix, e.g. `20261018T101500Z-1a2b3c4d`.
pub fn new_run_id() -> String {
    let mut suffix = uuid::Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    format!("{}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"), suffix)
}
