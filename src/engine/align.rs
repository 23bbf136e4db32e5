use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaModel};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::constants::{CONTEXT_CHUNK_WORDS, MAX_SEQ_LEN};

use super::error::EngineError;
use super::mode::{EvaluationMode, ModelVariant, ScoreHead};
use super::text::{chunk_words, split_sentences};
use super::utils::load_pair_tokenizer;
use super::{ScoreParams, ScoringEngine};

/// Construction parameters for [`AlignEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub checkpoint: PathBuf,
    pub variant: ModelVariant,
    /// Encoder architecture. [`EngineConfig::for_variant`] fills in the variant's.
    pub encoder: Config,
    /// Default mode, checked at load time.
    pub evaluation_mode: String,
}

impl EngineConfig {
    pub fn for_variant(
        checkpoint: impl Into<PathBuf>,
        variant: ModelVariant,
        evaluation_mode: impl Into<String>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            checkpoint: checkpoint.into(),
            variant,
            encoder: variant.encoder_config()?,
            evaluation_mode: evaluation_mode.into(),
        })
    }
}

/// RoBERTa encoder with the pooler and the three alignment heads.
pub(crate) struct AlignModel {
    encoder: XLMRobertaModel,
    pooler: Linear,
    bin_head: Linear,
    tri_head: Linear,
    reg_head: Linear,
}

impl AlignModel {
    pub(crate) fn load(vb: VarBuilder, config: &Config) -> candle_core::Result<Self> {
        let hidden_size = config.hidden_size;
        let base = vb.pp("base_model");
        let encoder = XLMRobertaModel::new(config, base.clone())?;
        let pooler = candle_nn::linear(hidden_size, hidden_size, base.pp("pooler").pp("dense"))?;

        Ok(Self {
            encoder,
            pooler,
            bin_head: candle_nn::linear(hidden_size, 2, vb.pp("bin_layer"))?,
            tri_head: candle_nn::linear(hidden_size, 3, vb.pp("tri_layer"))?,
            reg_head: candle_nn::linear(hidden_size, 1, vb.pp("reg_layer"))?,
        })
    }

    /// Returns one score per row of the batch for the requested head.
    ///
    /// Position ids start after the padding id and skip padding, as RoBERTa was trained.
    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
        head: ScoreHead,
    ) -> candle_core::Result<Vec<f32>> {
        let hidden = self
            .encoder
            .forward(input_ids, attention_mask, token_type_ids, None, None, None)?;
        let cls = hidden.i((.., 0, ..))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;

        let scores = match head {
            ScoreHead::Bin => {
                candle_nn::ops::softmax_last_dim(&self.bin_head.forward(&pooled)?)?.i((.., 1))?
            }
            ScoreHead::Nli => {
                candle_nn::ops::softmax_last_dim(&self.tri_head.forward(&pooled)?)?.i((.., 0))?
            }
            ScoreHead::Reg => self.reg_head.forward(&pooled)?.i((.., 0))?,
        };

        scores.to_dtype(DType::F32)?.to_vec1::<f32>()
    }
}

/// Factual-consistency scorer backed by an AlignScore checkpoint.
///
/// Batch size and evaluation mode come from each call's [`ScoreParams`].
pub struct AlignEngine {
    model: AlignModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl std::fmt::Debug for AlignEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignEngine")
            .field("device", &format!("{:?}", self.device))
            .finish()
    }
}

impl AlignEngine {
    /// Loads weights and tokenizer. Expensive; call once per process.
    pub fn load(config: EngineConfig, device: Device) -> Result<Self, EngineError> {
        if !config.checkpoint.exists() {
            return Err(EngineError::CheckpointNotFound {
                path: config.checkpoint,
            });
        }

        let evaluation_mode: EvaluationMode = config.evaluation_mode.parse()?;

        info!(
            checkpoint = %config.checkpoint.display(),
            backbone = %config.variant,
            evaluation_mode = %evaluation_mode,
            "Loading AlignScore checkpoint"
        );

        let vb = load_weights(&config.checkpoint, &device)?;
        let model = AlignModel::load(vb, &config.encoder).map_err(
            |e| EngineError::ModelLoadFailed {
                reason: format!("Failed to load {} weights: {}", config.variant, e),
            },
        )?;

        let tokenizer = load_pair_tokenizer(&config.checkpoint, MAX_SEQ_LEN).map_err(|e| {
            EngineError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(backbone = %config.variant, "AlignScore model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn infer(
        &self,
        pairs: Vec<(String, String)>,
        head: ScoreHead,
        batch_size: usize,
    ) -> Result<Vec<f32>, EngineError> {
        let mut scores = Vec::with_capacity(pairs.len());

        for batch in pairs.chunks(batch_size.max(1)) {
            let encodings = self.tokenizer.encode_batch(batch.to_vec(), true).map_err(|e| {
                EngineError::TokenizationFailed {
                    reason: e.to_string(),
                }
            })?;

            let input_ids = self.stack(&encodings, Encoding::get_ids)?;
            // RoBERTa has a single token type.
            let type_ids = input_ids.zeros_like()?;
            let attention_mask = self.stack(&encodings, Encoding::get_attention_mask)?;

            let batch_scores = self
                .model
                .forward(&input_ids, &type_ids, &attention_mask, head)
                .map_err(|e| EngineError::InferenceFailed {
                    reason: e.to_string(),
                })?;

            debug!(batch = batch.len(), "Scored batch");
            scores.extend(batch_scores);
        }

        Ok(scores)
    }

    fn stack(
        &self,
        encodings: &[Encoding],
        field: fn(&Encoding) -> &[u32],
    ) -> Result<Tensor, EngineError> {
        let rows = encodings
            .iter()
            .map(|encoding| Tensor::new(field(encoding), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        Ok(Tensor::stack(&rows, 0)?)
    }
}

impl ScoringEngine for AlignEngine {
    fn score(
        &self,
        contexts: &[String],
        claims: &[String],
        params: &ScoreParams,
    ) -> Result<Vec<f32>, EngineError> {
        let mode: EvaluationMode = params.evaluation_mode.parse()?;

        if !mode.sentence_pair {
            let pairs = contexts.iter().cloned().zip(claims.iter().cloned()).collect();
            return self.infer(pairs, mode.head, params.batch_size);
        }

        // Each item expands into (chunk, sentence) pairs; remember the grid shape to fold back.
        let mut pairs = Vec::new();
        let mut shapes = Vec::with_capacity(contexts.len());
        for (context, claim) in contexts.iter().zip(claims) {
            let chunks = chunk_words(context, CONTEXT_CHUNK_WORDS);
            let sentences = split_sentences(claim);
            shapes.push((sentences.len(), chunks.len()));

            for sentence in &sentences {
                for chunk in &chunks {
                    pairs.push((chunk.clone(), sentence.clone()));
                }
            }
        }

        debug!(
            items = contexts.len(),
            pairs = pairs.len(),
            "Expanded sentence-pair inputs"
        );

        let raw = self.infer(pairs, mode.head, params.batch_size)?;
        Ok(fold_sentence_scores(&raw, &shapes))
    }
}

/// Max over context chunks per claim sentence, then mean over sentences, per item.
pub(crate) fn fold_sentence_scores(raw: &[f32], shapes: &[(usize, usize)]) -> Vec<f32> {
    let mut offset = 0;
    shapes
        .iter()
        .map(|&(sentences, chunks)| {
            let item = &raw[offset..offset + sentences * chunks];
            offset += sentences * chunks;

            let total: f32 = item
                .chunks(chunks.max(1))
                .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
                .sum();
            total / sentences.max(1) as f32
        })
        .collect()
}

fn load_weights(checkpoint: &Path, device: &Device) -> Result<VarBuilder<'static>, EngineError> {
    let is_safetensors = checkpoint
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));

    let load_failed = |e: candle_core::Error| EngineError::ModelLoadFailed {
        reason: format!("Failed to read {}: {}", checkpoint.display(), e),
    };

    if is_safetensors {
        // SAFETY: the checkpoint is mapped read-only and is not modified while the process runs.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[checkpoint], DType::F32, device)
                .map_err(load_failed)?
        };
        return Ok(vb);
    }

    let tensors = candle_core::pickle::PthTensors::new(checkpoint, Some("state_dict"))
        .map_err(load_failed)?;
    Ok(VarBuilder::from_backend(
        Box::new(tensors),
        DType::F32,
        device.clone(),
    ))
}
