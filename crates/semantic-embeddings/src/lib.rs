#![deny(clippy::all)]

mod error;
mod model;

// Re-export for external use
pub use error::{EmbeddingError, Result};
pub use model::ModelManager;

/// Type alias for an embedding vector.
pub type Embedding = Vec<f32>;

/// Semantic embedding generator for text content.
///
/// Wraps ModelManager with a convenient API for loading a checkpoint from
/// disk and generating embeddings.
///
/// # Example
/// ```ignore
/// use semantic_embeddings::SemanticEmbeddings;
/// use std::path::Path;
///
/// let embeddings = SemanticEmbeddings::load_model_from_dir(Path::new("models/all-MiniLM-L6-v2"))?;
///
/// let embedding = embeddings.encode("Hello world")?;
/// println!("Embedding dimension: {}", embedding.len());
/// ```
pub struct SemanticEmbeddings {
    model: ModelManager,
}

impl SemanticEmbeddings {
    /// Load model from a directory containing config.json, tokenizer.json, and model.safetensors.
    ///
    /// # Expected files
    /// - `config.json` - Model configuration
    /// - `tokenizer.json` - Tokenizer configuration
    /// - `model.safetensors` - Model weights
    /// - `tokenizer_config.json` - Optional, supplies the truncation length
    pub fn load_model_from_dir(model_dir: &std::path::Path) -> Result<Self> {
        let model = ModelManager::load_from_dir(model_dir)?;
        tracing::info!(
            dimension = model.hidden_size(),
            max_length = model.max_length(),
            "Loaded embedding model from {}",
            model_dir.display()
        );
        Ok(Self { model })
    }

    /// Encode a single text into an embedding vector.
    pub fn encode(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.model.encode_batch(&[text.to_string()])?;
        Ok(vectors.pop().unwrap_or_default())
    }

    /// Encode multiple texts jointly in one forward pass.
    ///
    /// Returns one embedding per text, in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.model.encode_batch(texts)
    }

    /// Width of the vectors this model produces.
    pub fn dimension(&self) -> usize {
        self.model.hidden_size()
    }

    /// Tokens kept per text before truncation.
    pub fn max_length(&self) -> usize {
        self.model.max_length()
    }
}
