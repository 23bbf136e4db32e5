//! Cross-cutting, shared constants.
//!
//! Defaults here are the values the service falls back to when the matching
//! `ALIGNSCORE_*` environment variable is unset or malformed.

/// Checkpoint loaded when `ALIGNSCORE_MODEL_PATH` is not set.
pub const DEFAULT_MODEL_PATH: &str = "models/AlignScore-large.ckpt";

/// Device preference when `ALIGNSCORE_DEVICE` is not set.
pub const DEFAULT_DEVICE: &str = "auto";

/// Evaluation mode when `ALIGNSCORE_EVAL_MODE` is not set.
pub const DEFAULT_EVAL_MODE: &str = "nli_sp";

pub const DEFAULT_BATCH_SIZE: usize = 8;

pub const DEFAULT_PORT: u16 = 9000;

/// Maximum tokens per (context, claim) pair fed to the encoder.
pub const MAX_SEQ_LEN: usize = 512;

/// Context chunk size (in words) used by sentence-pair evaluation modes.
pub const CONTEXT_CHUNK_WORDS: usize = 350;

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generic detail rendered for every 500 response.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";
