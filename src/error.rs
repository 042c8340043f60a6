//! Error types for the adcraft creative generation pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Generation backend errors (transport, auth, quota, safety, payload shape)
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    #[error("Backend authentication failed: {0}")]
    AuthFailed(String),

    #[error("Backend rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Backend model not found: {0}")]
    ModelNotFound(String),

    #[error("Backend call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Content blocked by safety filter: {0}")]
    SafetyBlocked(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

/// Pipeline-level errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid brief: {0}")]
    InvalidBrief(String),

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Marker '{marker}' not found in generated text")]
    MarkerNotFound { marker: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{kind} not found: {}", path.display())]
    MissingResource { kind: &'static str, path: PathBuf },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Structured output that did not match the requested schema.
    pub fn is_schema_validation(&self) -> bool {
        matches!(self, PipelineError::SchemaValidation(_))
    }

    /// Errors that abort a whole run rather than a single slot.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Config(_)
                | PipelineError::InvalidBrief(_)
                | PipelineError::Backend(BackendError::NotConfigured(_))
                | PipelineError::Backend(BackendError::InitializationFailed(_))
        )
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}
