//! AlignScore library crate (used by the server and integration tests).
//!
//! Scores how factually consistent a claim is with a context, using an AlignScore
//! checkpoint on a RoBERTa backbone.
//!
//! ## Layout
//! - [`config`]: [`ServiceSettings`] for the scorer and [`ServerConfig`] for the listener
//! - [`engine`]: the [`ScoringEngine`] seam, device resolution and the candle model
//! - [`runner`]: the shared [`Runner`] and its lazily constructed [`RunnerCell`]
//! - [`gateway`]: the Axum router serving `/score` and `/healthz`
//!
//! ## Test/Mock Support
//! [`MockEngine`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod engine;
pub mod gateway;
pub mod runner;

pub use config::{ConfigError, ServerConfig, ServiceSettings};
pub use engine::{DeviceKind, EngineError, EvaluationMode, ScoreParams, ScoringEngine};
#[cfg(any(test, feature = "mock"))]
pub use engine::MockEngine;
pub use gateway::{HandlerState, create_router_with_state};
pub use runner::{Runner, RunnerCell, RunnerError};
