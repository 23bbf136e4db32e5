use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The checkpoint is missing. Fatal at startup.
    #[error("AlignScore checkpoint not found at {}", .path.display())]
    Configuration { path: PathBuf },

    /// Caller-supplied input was rejected. Recoverable per request.
    #[error("{reason}")]
    InvalidInput { reason: String },

    #[error("scoring engine error: {0}")]
    Engine(EngineError),

    /// The blocking worker running the engine died (panic or runtime shutdown).
    #[error("scoring worker failed: {reason}")]
    WorkerFailed { reason: String },
}

impl RunnerError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RunnerError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RunnerError::InvalidInput { .. })
    }
}

impl From<EngineError> for RunnerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::CheckpointNotFound { path } => RunnerError::Configuration { path },
            EngineError::UnsupportedMode { .. } => RunnerError::InvalidInput {
                reason: err.to_string(),
            },
            other => RunnerError::Engine(other),
        }
    }
}
