use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("checkpoint not found at path: {path}")]
    CheckpointNotFound { path: PathBuf },

    #[error("failed to load scoring model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("scoring inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error(
        "unsupported evaluation mode '{mode}': expected nli, bin or reg, optionally suffixed with _sp"
    )]
    UnsupportedMode { mode: String },
}

impl From<candle_core::Error> for EngineError {
    fn from(err: candle_core::Error) -> Self {
        EngineError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
