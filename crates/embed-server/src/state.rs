use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use semantic_embeddings::SemanticEmbeddings;

use crate::embedder::Embedder;
use crate::error::ApiError;
use crate::pool::InferencePool;

/// Shared application state, built once before the server accepts
/// connections and never mutated afterwards.
pub struct AppState {
    embedder: Option<Arc<dyn Embedder>>,
    pool: InferencePool,
}

impl AppState {
    /// State without a model; every inference request answers 503.
    pub fn loading(pool: InferencePool) -> Self {
        Self {
            embedder: None,
            pool,
        }
    }

    pub fn ready(embedder: Arc<dyn Embedder>, pool: InferencePool) -> Self {
        Self {
            embedder: Some(embedder),
            pool,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, ApiError> {
        self.embedder.clone().ok_or(ApiError::NotReady)
    }

    pub fn pool(&self) -> &InferencePool {
        &self.pool
    }
}

/// Load the model and tokenizer from `model_dir` on the blocking pool.
///
/// Any failure is fatal to startup; there is no degraded mode.
pub async fn load_embedder(model_dir: PathBuf) -> Result<Arc<dyn Embedder>> {
    let embeddings = tokio::task::spawn_blocking(move || {
        SemanticEmbeddings::load_model_from_dir(&model_dir)
            .with_context(|| format!("Failed to load model from {}", model_dir.display()))
    })
    .await
    .context("Model loading task failed")??;

    Ok(Arc::new(embeddings))
}
