use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the model or computing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model config: {0}")]
    Config(String),

    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),

    /// The tokenizer rejected one of the request texts.
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error(transparent)]
    Inference(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
