//! The inference seam handlers depend on.

use semantic_embeddings::{EmbeddingError, SemanticEmbeddings};

/// Turns a batch of texts into one vector per text, in input order.
///
/// Implementations are shared read-only across requests.
pub trait Embedder: Send + Sync + 'static {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

impl Embedder for SemanticEmbeddings {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.encode_batch(texts)
    }
}
