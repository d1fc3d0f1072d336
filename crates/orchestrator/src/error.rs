//! Error types for the launch orchestrator

use launchpad_types::{Checkpoint, LaunchpadError};
use thiserror::Error;
use uuid::Uuid;

/// Main orchestrator error type
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Launchpad(#[from] LaunchpadError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Launch not found: {0}")]
    LaunchNotFound(Uuid),

    #[error("Launch {0} is already being driven")]
    LaunchBusy(Uuid),

    #[error("Launch {id} cannot be retried: {reason}")]
    NotRetryable { id: Uuid, reason: String },

    #[error("Launch {id} cannot be cancelled at {at:?}")]
    NotCancellable { id: Uuid, at: Option<Checkpoint> },

    #[error("Token symbol already launched: {0}")]
    SymbolTaken(String),
}

/// Result type alias for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl From<std::io::Error> for OrchestratorError {
    fn from(err: std::io::Error) -> Self {
        OrchestratorError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        OrchestratorError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for OrchestratorError {
    fn from(err: toml::de::Error) -> Self {
        OrchestratorError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for OrchestratorError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrchestratorError::Configuration(err.to_string())
    }
}
