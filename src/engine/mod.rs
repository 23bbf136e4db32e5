//! Scoring engine and model utilities.
//!
//! - [`ScoringEngine`] is the seam the runner scores through.
//! - [`AlignEngine`] implements it with a candle RoBERTa encoder and the AlignScore heads.
//! - [`device`] resolves the configured compute preference to a concrete backend.

pub mod align;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Evaluation modes and checkpoint variants.
pub mod mode;
pub mod text;
/// Tokenizer loading helpers.
pub mod utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use align::{AlignEngine, EngineConfig};
pub use device::{
    AcceleratorProbe, CandleProbe, DeviceKind, DevicePreference, create_device, resolve_device,
    select_device,
};
pub use error::EngineError;
pub use mode::{EvaluationMode, ModelVariant, ScoreHead};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockEngine;

/// Per-call scoring parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParams {
    pub batch_size: usize,
    /// Opaque mode tag; the engine decides whether it is valid.
    pub evaluation_mode: String,
}

/// A loaded scorer: one score per `(context, claim)` pair, in input order.
///
/// Callers guarantee `contexts.len() == claims.len()`.
pub trait ScoringEngine: Send + Sync + std::fmt::Debug {
    fn score(
        &self,
        contexts: &[String],
        claims: &[String],
        params: &ScoreParams,
    ) -> Result<Vec<f32>, EngineError>;
}
