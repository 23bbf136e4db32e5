use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::error::EngineError;
use super::mode::EvaluationMode;
use super::{ScoreParams, ScoringEngine};

/// Arguments of one recorded [`MockEngine::score`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub contexts: Vec<String>,
    pub claims: Vec<String>,
    pub params: ScoreParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Behavior {
    #[default]
    Score,
    Fail,
    Panic,
}

/// Deterministic in-process engine for tests.
///
/// Scores are lexical overlap between claim and context in `[0, 1]`.
#[derive(Debug, Default)]
pub struct MockEngine {
    calls: AtomicUsize,
    last_call: Mutex<Option<MockCall>>,
    behavior: Behavior,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with [`EngineError::InferenceFailed`].
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Self::default()
        }
    }

    /// Every call panics.
    pub fn panicking() -> Self {
        Self {
            behavior: Behavior::Panic,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<MockCall> {
        self.last_call.lock().clone()
    }
}

impl ScoringEngine for MockEngine {
    fn score(
        &self,
        contexts: &[String],
        claims: &[String],
        params: &ScoreParams,
    ) -> Result<Vec<f32>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock() = Some(MockCall {
            contexts: contexts.to_vec(),
            claims: claims.to_vec(),
            params: params.clone(),
        });

        params.evaluation_mode.parse::<EvaluationMode>()?;

        match self.behavior {
            Behavior::Score => Ok(contexts
                .iter()
                .zip(claims)
                .map(|(context, claim)| overlap_score(context, claim))
                .collect()),
            Behavior::Fail => Err(EngineError::InferenceFailed {
                reason: "mock engine failure: device lost".to_string(),
            }),
            Behavior::Panic => panic!("mock engine panicked"),
        }
    }
}

/// Share of the claim's words that appear in the context.
pub fn overlap_score(context: &str, claim: &str) -> f32 {
    let words = |text: &str| -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    };

    let context_words = words(context);
    let claim_words = words(claim);
    if claim_words.is_empty() {
        return 0.0;
    }

    let matches = claim_words.intersection(&context_words).count();
    matches as f32 / claim_words.len() as f32
}
