//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::{command_name, needs_backend};
use crate::cli::parse::{BriefArgs, Commands, ConfigCommands, OutputFormat};
use crate::cli::presentation::{
    format_campaign_copy_json, format_campaign_copy_text, format_config_json,
    format_config_paths, format_config_text, format_copy_json, format_copy_text,
    format_file_result, format_run_json, format_run_text, format_strategies_json,
    format_strategies_text, format_validation_result, format_visual_prompt, ProgressPrinter,
};
use crate::composer::{self, AdComposer};
use crate::config::{
    global_config_path, workspace_config_files, AdcraftConfig, ConfigLoader, OutputConfig,
};
use crate::copywriter::{CopyGenerator, CopyRequest};
use crate::error::PipelineError;
use crate::image::ImageGenerator;
use crate::model::{CreativeBrief, Platform};
use crate::pipeline::PipelineOrchestrator;
use crate::provider::{GeminiBackend, GenerationBackend, GenerationClient, ScriptedBackend};
use crate::strategy::StrategicPromptExpander;
use crate::visual::{VisualPromptSynthesizer, VisualRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace, effective configuration
/// and backend selection. Built from workspace path and optional config path
/// using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: AdcraftConfig,
    output: OutputConfig,
    offline: bool,
    quiet: bool,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let mut loader = ConfigLoader::new(&workspace_root);
        if let Some(path) = &config_path {
            loader = loader.with_file(path);
        }
        Self::from_config(workspace_root, config_path, loader.load()?)
    }

    /// Context over an already-loaded configuration.
    pub fn from_config(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        config: AdcraftConfig,
    ) -> Result<Self, PipelineError> {
        let output = config.output.resolved(&workspace_root);
        Ok(Self {
            workspace_root,
            config_path,
            config,
            output,
            offline: false,
            quiet: false,
        })
    }

    /// Answer every backend call with the built-in offline backend.
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Suppress progress lines on stderr.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &AdcraftConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        let started = Instant::now();
        let name = command_name(command);
        if needs_backend(command) {
            self.config.ensure_valid()?;
        }
        let result = self.execute_inner(command).await;
        match &result {
            Ok(_) => info!(
                command = %name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Command finished"
            ),
            Err(e) => warn!(command = %name, error = %e, "Command failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, PipelineError> {
        match command {
            Commands::Generate {
                brief,
                platforms,
                variations,
                goal,
                no_compose,
                base_image,
                concurrency,
                run_id,
                export,
                format,
            } => {
                let brief = build_brief(brief)?;
                let mut options = self.config.pipeline.options()?;
                if !platforms.is_empty() {
                    options.platforms = platforms
                        .iter()
                        .map(|name| name.parse())
                        .collect::<Result<Vec<Platform>, _>>()?;
                }
                if let Some(variations) = variations {
                    options.variations_per_platform = *variations;
                }
                if let Some(goal) = goal {
                    options.goal = goal.parse()?;
                }
                if *no_compose {
                    options.compose = false;
                }
                if let Some(base_image) = base_image {
                    options.base_image = Some(self.resolve(base_image));
                }
                if let Some(concurrency) = concurrency {
                    options.max_concurrent_slots = *concurrency;
                }
                options.run_id = run_id.clone();

                let client = self.client()?;
                let images = ImageGenerator::new(client.clone(), &self.output.images_dir)
                    .with_slug_max_len(self.output.slug_max_len);
                let mut orchestrator = PipelineOrchestrator::new(client, options)
                    .with_output_dirs(&self.output.images_dir, &self.output.ads_dir)
                    .with_image_generator(images)
                    .with_strategy_policy(self.config.pipeline.strategy_policy())
                    .with_copy_policy(self.config.pipeline.copy_policy())
                    .with_copy_options(self.config.pipeline.copy_options());
                if !self.quiet {
                    orchestrator = orchestrator.with_observer(Arc::new(ProgressPrinter));
                }

                let state = orchestrator.run(brief).await?;
                if let Some(path) = export {
                    let path = self.resolve(path);
                    state.export_copy().write_to(&path)?;
                    info!(path = %path.display(), "Copy export written");
                }
                match format {
                    OutputFormat::Json => format_run_json(&state),
                    OutputFormat::Text => Ok(format_run_text(&state)),
                }
            }
            Commands::Strategies { brief, format } => {
                let brief = build_brief(brief)?;
                let client = self.client()?;
                client.ensure_initialized().await?;
                let outcome = StrategicPromptExpander::new(client)
                    .with_policy(self.config.pipeline.strategy_policy())
                    .expand(&brief)
                    .await?;
                match format {
                    OutputFormat::Json => format_strategies_json(&outcome),
                    OutputFormat::Text => Ok(format_strategies_text(&outcome)),
                }
            }
            Commands::Copy {
                brief,
                count,
                temperature,
                format,
            } => {
                let brief = build_brief(brief)?;
                let count = count.unwrap_or(self.config.pipeline.variations_per_platform);
                let mut options = self.config.pipeline.copy_options();
                if temperature.is_some() {
                    options.temperature = *temperature;
                }
                let client = self.client()?;
                client.ensure_initialized().await?;
                let platform = brief.platform().clone();
                let results = CopyGenerator::new(client)
                    .with_policy(self.config.pipeline.copy_policy())
                    .with_options(options)
                    .generate(&CopyRequest::new(&brief, &platform, count))
                    .await?;
                match format {
                    OutputFormat::Json => format_copy_json(&platform, &results),
                    OutputFormat::Text => Ok(format_copy_text(&platform, &results)),
                }
            }
            Commands::CampaignCopy {
                brief,
                count,
                out,
                format,
            } => {
                let brief = build_brief(brief)?;
                let count = count.unwrap_or(self.config.pipeline.variations_per_platform);
                let client = self.client()?;
                client.ensure_initialized().await?;
                let export = CopyGenerator::new(client)
                    .with_policy(self.config.pipeline.copy_policy())
                    .with_options(self.config.pipeline.copy_options())
                    .generate_campaign_copy(&brief, count)
                    .await?;
                if let Some(path) = out {
                    let path = self.resolve(path);
                    export.write_to(&path)?;
                    info!(path = %path.display(), "Copy export written");
                }
                match format {
                    OutputFormat::Json => format_campaign_copy_json(&export),
                    OutputFormat::Text => Ok(format_campaign_copy_text(&export)),
                }
            }
            Commands::Visual {
                brief,
                ad_copy,
                goal,
                hint,
                format,
            } => {
                let brief = build_brief(brief)?;
                let goal = match goal {
                    Some(goal) => goal.parse()?,
                    None => self.config.pipeline.goal,
                };
                let client = self.client()?;
                client.ensure_initialized().await?;
                let request = VisualRequest {
                    ad_copy,
                    brief: &brief,
                    platform: brief.platform(),
                    goal,
                    image_prompt_hint: hint.as_deref(),
                };
                let prompt = VisualPromptSynthesizer::new(client).synthesize(&request).await?;
                format_visual_prompt(&prompt, *format)
            }
            Commands::Image {
                prompt,
                name,
                format,
            } => {
                let client = self.client()?;
                let path = ImageGenerator::new(client, &self.output.images_dir)
                    .with_slug_max_len(self.output.slug_max_len)
                    .generate(prompt, name.as_deref())
                    .await?;
                format_file_result("Image", &path, *format)
            }
            Commands::Compose {
                ad_copy,
                base_image,
                platform,
                output,
                format,
            } => {
                let platform: Platform = platform.parse()?;
                let output_name = output
                    .clone()
                    .unwrap_or_else(|| composer::default_output_filename(&platform));
                let base_image = base_image.as_ref().map(|path| self.resolve(path));
                let client = self.client()?;
                let path = AdComposer::new(client, &self.output.ads_dir)
                    .with_default_base_image(&self.output.default_base_image)
                    .compose(ad_copy, base_image.as_deref(), &output_name)
                    .await?;
                format_file_result("Creative", &path, *format)
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, PipelineError> {
        match command {
            ConfigCommands::Show { format } => match format {
                OutputFormat::Json => format_config_json(&self.config),
                OutputFormat::Text => format_config_text(&self.config),
            },
            ConfigCommands::Validate => {
                let result = self.config.validate();
                let text = format_validation_result(&result);
                match result {
                    Ok(()) => Ok(text),
                    Err(_) => Err(PipelineError::Config(text)),
                }
            }
            ConfigCommands::Paths => {
                let profile = ConfigLoader::new(&self.workspace_root).profile();
                let [base, profile_file] = workspace_config_files(&self.workspace_root, &profile);
                let mut paths = vec![
                    ("global".to_string(), global_config_path()),
                    ("workspace".to_string(), Some(base)),
                    (profile, Some(profile_file)),
                ];
                if let Some(path) = &self.config_path {
                    paths.push(("explicit".to_string(), Some(path.clone())));
                }
                Ok(format_config_paths(&paths))
            }
        }
    }

    /// Backend client for this invocation. Live runs need credentials first.
    fn client(&self) -> Result<Arc<GenerationClient>, PipelineError> {
        let backend: Arc<dyn GenerationBackend> = if self.offline {
            Arc::new(ScriptedBackend::offline())
        } else {
            self.config.require_credentials()?;
            Arc::new(GeminiBackend::new(self.config.backend.gemini_settings())?)
        };
        info!(backend = backend.backend_name(), "Generation backend selected");
        Ok(Arc::new(GenerationClient::with_timeout(
            backend,
            self.config.backend.request_timeout(),
        )))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

fn build_brief(args: &BriefArgs) -> Result<CreativeBrief, PipelineError> {
    CreativeBrief::new(&args.product, &args.audience, args.platform.parse()?)
}
