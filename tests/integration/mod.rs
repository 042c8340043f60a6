//! Integration tests for the adcraft creative generation pipeline

mod cli_offline;
mod config_loading;
mod export_roundtrip;
mod gemini_strategies;
mod image_generation;
mod pipeline_run;
mod strategy_fallback;
mod test_utils;
