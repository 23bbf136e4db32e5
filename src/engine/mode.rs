use std::fmt;
use std::path::Path;
use std::str::FromStr;

use candle_transformers::models::xlm_roberta::Config;

use super::error::EngineError;

/// Classification head a score is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreHead {
    /// Probability of "entailment" from the 3-way NLI head.
    Nli,
    /// Probability of "aligned" from the binary head.
    Bin,
    /// Raw output of the regression head.
    Reg,
}

impl ScoreHead {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreHead::Nli => "nli",
            ScoreHead::Bin => "bin",
            ScoreHead::Reg => "reg",
        }
    }
}

/// Parsed evaluation mode tag such as `nli_sp` or `bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationMode {
    pub head: ScoreHead,
    /// Split context into chunks and claims into sentences before scoring.
    pub sentence_pair: bool,
}

impl FromStr for EvaluationMode {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let (head, sentence_pair) = match normalized.strip_suffix("_sp") {
            Some(head) => (head, true),
            None => (normalized.as_str(), false),
        };

        let head = match head {
            "nli" => ScoreHead::Nli,
            "bin" => ScoreHead::Bin,
            "reg" => ScoreHead::Reg,
            _ => {
                return Err(EngineError::UnsupportedMode {
                    mode: value.to_string(),
                });
            }
        };

        Ok(Self {
            head,
            sentence_pair,
        })
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sentence_pair {
            write!(f, "{}_sp", self.head.as_str())
        } else {
            f.write_str(self.head.as_str())
        }
    }
}

/// Parameter-scale variant of the checkpoint's backbone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Base,
    Large,
}

impl ModelVariant {
    /// `Base` if the checkpoint's file stem contains "base" (any case), otherwise `Large`.
    pub fn from_checkpoint(path: &Path) -> Self {
        let is_base = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase().contains("base"))
            .unwrap_or(false);

        if is_base { Self::Base } else { Self::Large }
    }

    pub fn backbone(&self) -> &'static str {
        match self {
            ModelVariant::Base => "roberta-base",
            ModelVariant::Large => "roberta-large",
        }
    }

    pub fn hidden_size(&self) -> usize {
        match self {
            ModelVariant::Base => 768,
            ModelVariant::Large => 1024,
        }
    }

    /// Encoder architecture handed to the model loader.
    pub fn encoder_config(&self) -> Result<Config, EngineError> {
        let (layers, heads, intermediate) = match self {
            ModelVariant::Base => (12, 12, 3072),
            ModelVariant::Large => (24, 16, 4096),
        };

        let value = serde_json::json!({
            "vocab_size": 50265,
            "hidden_size": self.hidden_size(),
            "num_hidden_layers": layers,
            "num_attention_heads": heads,
            "intermediate_size": intermediate,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "attention_probs_dropout_prob": 0.1,
            "max_position_embeddings": 514,
            "type_vocab_size": 1,
            "layer_norm_eps": 1e-5,
            "pad_token_id": 1,
            "position_embedding_type": "absolute",
        });

        serde_json::from_value(value).map_err(|e| EngineError::ModelLoadFailed {
            reason: format!("invalid {} encoder config: {}", self.backbone(), e),
        })
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backbone())
    }
}
