//! CLI parse: clap types for adcraft. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// adcraft - multi-platform ad creative generation
#[derive(Parser, Debug)]
#[command(name = "adcraft")]
#[command(about = "Generate strategic angles, ad copy, visuals and composed creatives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file layered over the workspace configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use the built-in offline backend (no credentials, placeholder images)
    #[arg(long)]
    pub offline: bool,

    /// Debug-level logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging and progress lines
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The brief every generation command starts from.
#[derive(Args, Debug, Clone)]
pub struct BriefArgs {
    /// What is being advertised
    #[arg(long)]
    pub product: String,

    /// Who the ads are for
    #[arg(long)]
    pub audience: String,

    /// Primary platform (Facebook, Google, TikTok, or any other name)
    #[arg(long, default_value = "Facebook")]
    pub platform: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: strategies, copy, visuals, images and composition
    Generate {
        #[command(flatten)]
        brief: BriefArgs,
        /// Platforms to generate for (comma-separated); config default when omitted
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<String>,
        /// Variations per platform
        #[arg(long)]
        variations: Option<usize>,
        /// Campaign goal (awareness, consideration, conversion)
        #[arg(long)]
        goal: Option<String>,
        /// Skip composition; keep raw images only
        #[arg(long)]
        no_compose: bool,
        /// Compose onto this image instead of each generated image
        #[arg(long)]
        base_image: Option<PathBuf>,
        /// Slots processed concurrently
        #[arg(long)]
        concurrency: Option<usize>,
        /// Name of the composed-output subdirectory
        #[arg(long)]
        run_id: Option<String>,
        /// Write the platform copy export (ads.json format) here
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Expand a brief into five strategic angles
    Strategies {
        #[command(flatten)]
        brief: BriefArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write ad copy variations for the brief's platform
    Copy {
        #[command(flatten)]
        brief: BriefArgs,
        /// Number of variations
        #[arg(long)]
        count: Option<usize>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write copy for Facebook, Google and TikTok in one validated request
    CampaignCopy {
        #[command(flatten)]
        brief: BriefArgs,
        /// Variations per platform
        #[arg(long)]
        count: Option<usize>,
        /// Write the export (ads.json format) here
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Turn ad copy into a detailed visual prompt
    Visual {
        #[command(flatten)]
        brief: BriefArgs,
        /// Ad copy the visual should support
        #[arg(long)]
        ad_copy: String,
        /// Campaign goal (awareness, consideration, conversion)
        #[arg(long)]
        goal: Option<String>,
        /// Visual direction to carry into the prompt
        #[arg(long)]
        hint: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate one image from a visual prompt
    Image {
        /// Visual prompt
        #[arg(long)]
        prompt: String,
        /// File name stem; derived from the prompt when omitted
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compose ad copy onto an existing base image
    Compose {
        /// Ad copy to place on the image
        #[arg(long)]
        ad_copy: String,
        /// Base image; the configured default when omitted
        #[arg(long)]
        base_image: Option<PathBuf>,
        /// Platform used for the default output name
        #[arg(long, default_value = "Facebook")]
        platform: String,
        /// Output file name inside the ads directory
        #[arg(long)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (secrets masked)
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate the effective configuration and report every problem
    Validate,
    /// Print the configuration file locations that are consulted
    Paths,
}
