//! adcraft: Multi-Platform Ad Creative Generation
//!
//! Turns a short creative brief into strategic angles, platform-specific ad
//! copy, detailed visual prompts, generated images and composed creatives,
//! through a pluggable generation backend.

pub mod cli;
pub mod composer;
pub mod config;
pub mod copywriter;
pub mod error;
pub mod image;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod strategy;
pub mod visual;
