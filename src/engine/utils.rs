use std::io;
use std::path::Path;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams, TruncationStrategy};

/// Loads the tokenizer that ships next to a checkpoint.
///
/// Accepts an explicit `tokenizer.json`, a model directory, or a checkpoint file (in which case
/// the sibling `tokenizer.json` is used).
pub fn load_tokenizer(checkpoint: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if checkpoint
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new("tokenizer.json"))
    {
        checkpoint.to_path_buf()
    } else if checkpoint.is_dir() {
        checkpoint.join("tokenizer.json")
    } else {
        checkpoint
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Checkpoint has no parent"))?
            .join("tokenizer.json")
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer configured for padded, truncated pair batches.
///
/// Only the first sequence (the context) is truncated; the claim is kept whole.
pub fn load_pair_tokenizer(checkpoint: &Path, max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(checkpoint)?;

    let truncation = TruncationParams {
        max_length: max_len,
        strategy: TruncationStrategy::OnlyFirst,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;

    if tokenizer.get_padding().is_none() {
        let pad_token = "<pad>".to_string();
        let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(1);
        tokenizer.with_padding(Some(PaddingParams {
            pad_id,
            pad_token,
            ..Default::default()
        }));
    }

    Ok(tokenizer)
}
