//! Error types for orchestrate
//!
//! Centralized error handling using thiserror. Only the fatal, run-level
//! failures live here; per-unit submission failures are recorded as
//! outcomes (see `scheduler::SubmissionError`).

use thiserror::Error;

/// Run-level errors that abort an orchestration before any submission
#[derive(Debug, Error)]
pub enum OrchestrateError {
    /// Work root missing, not a directory, or unreadable
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Required setting absent or inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Run summary serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestrateError {
    /// Whether this error comes from an invalid configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, OrchestrateError::Configuration(_))
    }

    /// Whether this error comes from work discovery
    pub fn is_discovery(&self) -> bool {
        matches!(self, OrchestrateError::Discovery(_))
    }
}

/// Result type alias for orchestrate operations
pub type Result<T> = std::result::Result<T, OrchestrateError>;
