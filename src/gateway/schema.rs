//! Wire types for `/score` and `/healthz`.

use serde::{Deserialize, Serialize};

use crate::gateway::error::GatewayError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreItem {
    /// Reference text / source document.
    pub context: String,
    /// Candidate text whose consistency is evaluated.
    pub claim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub items: Vec<ScoreItem>,

    #[serde(default)]
    pub evaluation_mode: Option<String>,

    /// Signed so that negative values reach validation instead of failing deserialization.
    #[serde(default)]
    pub batch_size: Option<i64>,
}

/// A request that passed validation: trimmed, non-empty texts and a positive batch size.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScoreRequest {
    pub contexts: Vec<String>,
    pub claims: Vec<String>,
    pub evaluation_mode: Option<String>,
    pub batch_size: Option<usize>,
}

impl ValidatedScoreRequest {
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl ScoreRequest {
    pub fn validate(self) -> Result<ValidatedScoreRequest, GatewayError> {
        if self.items.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "items: at least one item is required".to_string(),
            ));
        }

        let batch_size = match self.batch_size {
            Some(size) if size <= 0 => {
                return Err(GatewayError::InvalidRequest(format!(
                    "batch_size: must be greater than 0, got {size}"
                )));
            }
            Some(size) => Some(usize::try_from(size).map_err(|_| {
                GatewayError::InvalidRequest(format!("batch_size: {size} is too large"))
            })?),
            None => None,
        };

        let mut contexts = Vec::with_capacity(self.items.len());
        let mut claims = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.into_iter().enumerate() {
            contexts.push(non_empty(item.context, idx, "context")?);
            claims.push(non_empty(item.claim, idx, "claim")?);
        }

        Ok(ValidatedScoreRequest {
            contexts,
            claims,
            evaluation_mode: self.evaluation_mode,
            batch_size,
        })
    }
}

fn non_empty(text: String, idx: usize, field: &str) -> Result<String, GatewayError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidRequest(format!(
            "items[{idx}].{field}: Text must not be empty."
        )));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResponse {
    /// One score per request item, in request order.
    pub scores: Vec<f64>,
    pub evaluation_mode: String,
    pub batch_size: usize,
    pub device: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub device: String,
    pub evaluation_mode: String,
    pub batch_size: usize,
}
