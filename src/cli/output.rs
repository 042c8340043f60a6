//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{BackendError, PipelineError};

/// Map pipeline errors to a message for stderr, with a hint where one helps.
pub fn map_error(e: &PipelineError) -> String {
    let hint = match e {
        PipelineError::Config(msg) if msg.starts_with("Missing required environment variables") => {
            Some("Set the variable, or pass --offline to use placeholder content.")
        }
        PipelineError::Backend(BackendError::AuthFailed(_)) => {
            Some("Check that the API key is valid for the Generative Language API.")
        }
        PipelineError::Backend(BackendError::RateLimited(_)) => {
            Some("Wait and retry, or lower pipeline.max_concurrent_slots.")
        }
        PipelineError::MissingResource { kind: "Base image", .. } => {
            Some("Pass --base-image or set output.default_base_image.")
        }
        _ => None,
    };
    match hint {
        Some(hint) => format!("Error: {}\nHint: {}", e, hint),
        None => format!("Error: {}", e),
    }
}

/// Process exit code: 2 for usage and configuration problems, 1 otherwise.
pub fn exit_code(e: &PipelineError) -> i32 {
    match e {
        PipelineError::Config(_) | PipelineError::InvalidBrief(_) => 2,
        _ => 1,
    }
}
