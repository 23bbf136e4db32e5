//! Request-serving wrapper around one loaded scoring engine.
//!
//! [`Runner`] owns exactly one [`ScoringEngine`] and exposes a blocking
//! [`score`](Runner::score) plus an async [`score_async`](Runner::score_async) that runs the
//! blocking call on tokio's blocking pool. [`RunnerCell`] hands out the single shared runner,
//! constructing it at most once.
//!
//! # Per-call overrides
//!
//! `batch_size` and `evaluation_mode` overrides are resolved per call into a
//! [`ScoreParams`] and passed to the engine. They are never written back to shared state, so a
//! request without overrides always scores with the runner defaults, even while another request
//! with overrides is in flight.

pub mod cell;
pub mod error;


pub use cell::RunnerCell;
pub use error::RunnerError;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ServiceSettings;
use crate::engine::{
    AlignEngine, DeviceKind, EngineConfig, EngineError, ModelVariant, ScoreParams, ScoringEngine,
    select_device,
};

#[derive(Debug)]
pub struct Runner {
    engine: Arc<dyn ScoringEngine>,
    device: DeviceKind,
    evaluation_mode: String,
    default_batch_size: usize,
}

impl Runner {
    /// Resolves the device and loads the checkpoint named by `settings`.
    ///
    /// Fails with [`RunnerError::Configuration`] if the checkpoint does not exist. An unavailable
    /// accelerator is not an error; the runner falls back to CPU.
    pub fn new(settings: &ServiceSettings) -> Result<Self, RunnerError> {
        if !settings.model_path.exists() {
            return Err(RunnerError::Configuration {
                path: settings.model_path.clone(),
            });
        }

        let (device_kind, device) = select_device(&settings.device);
        let variant = ModelVariant::from_checkpoint(&settings.model_path);
        debug!(device = %device_kind, backbone = %variant, "Resolved runner configuration");

        let config = EngineConfig::for_variant(
            settings.model_path.clone(),
            variant,
            settings.evaluation_mode.clone(),
        )?;
        let engine = AlignEngine::load(config, device)?;

        Ok(Self::with_engine(
            Arc::new(engine),
            device_kind,
            settings.evaluation_mode.clone(),
            settings.batch_size,
        ))
    }

    /// Wraps an already-constructed engine.
    pub fn with_engine(
        engine: Arc<dyn ScoringEngine>,
        device: DeviceKind,
        evaluation_mode: impl Into<String>,
        default_batch_size: usize,
    ) -> Self {
        Self {
            engine,
            device,
            evaluation_mode: evaluation_mode.into(),
            default_batch_size: default_batch_size.max(1),
        }
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn evaluation_mode(&self) -> &str {
        &self.evaluation_mode
    }

    pub fn default_batch_size(&self) -> usize {
        self.default_batch_size
    }

    /// Parameters a call with these overrides will score with.
    ///
    /// A zero batch size or an empty mode counts as "no override".
    pub fn effective_params(
        &self,
        batch_size: Option<usize>,
        evaluation_mode: Option<&str>,
    ) -> ScoreParams {
        ScoreParams {
            batch_size: batch_size
                .filter(|size| *size > 0)
                .unwrap_or(self.default_batch_size),
            evaluation_mode: evaluation_mode
                .filter(|mode| !mode.is_empty())
                .unwrap_or(&self.evaluation_mode)
                .to_string(),
        }
    }

    /// Scores each `(contexts[i], claims[i])` pair. Blocks for the duration of inference.
    pub fn score(
        &self,
        contexts: &[String],
        claims: &[String],
        batch_size: Option<usize>,
        evaluation_mode: Option<&str>,
    ) -> Result<Vec<f64>, RunnerError> {
        if contexts.len() != claims.len() {
            return Err(RunnerError::invalid_input(format!(
                "contexts and claims must have the same length (got {} and {})",
                contexts.len(),
                claims.len()
            )));
        }

        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let params = self.effective_params(batch_size, evaluation_mode);
        debug!(
            pairs = contexts.len(),
            batch_size = params.batch_size,
            evaluation_mode = %params.evaluation_mode,
            "Scoring pairs"
        );

        let scores = self.engine.score(contexts, claims, &params)?;
        if scores.len() != contexts.len() {
            return Err(RunnerError::Engine(EngineError::InferenceFailed {
                reason: format!(
                    "engine returned {} scores for {} pairs",
                    scores.len(),
                    contexts.len()
                ),
            }));
        }

        Ok(scores.into_iter().map(f64::from).collect())
    }

    /// Same contract as [`score`](Self::score), run on the blocking pool.
    ///
    /// The blocking call runs to completion even if the returned future is dropped.
    pub async fn score_async(
        self: &Arc<Self>,
        contexts: Vec<String>,
        claims: Vec<String>,
        batch_size: Option<usize>,
        evaluation_mode: Option<String>,
    ) -> Result<Vec<f64>, RunnerError> {
        let runner = Arc::clone(self);

        tokio::task::spawn_blocking(move || {
            runner.score(&contexts, &claims, batch_size, evaluation_mode.as_deref())
        })
        .await
        .map_err(|e| RunnerError::WorkerFailed {
            reason: e.to_string(),
        })?
    }

    pub(crate) fn log_loaded(&self) {
        info!(
            device = %self.device,
            evaluation_mode = %self.evaluation_mode,
            batch_size = self.default_batch_size,
            "AlignScore runner ready"
        );
    }
}
