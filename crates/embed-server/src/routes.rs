//! Request handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EmbeddingsRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileEmbeddingResponse {
    pub file_name: Option<String>,
    pub embeddings: Option<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// POST /embed/
///
/// Embeds every text in one jointly padded batch. The response holds one
/// vector per text, in request order.
pub async fn embed_texts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
    let embedder = state.embedder()?;
    tracing::debug!("Embedding {} texts", request.texts.len());

    let texts = request.texts;
    let embeddings = state
        .pool()
        .run(move || embedder.embed(&texts))
        .await?
        .map_err(|e| ApiError::embedding("Error generating embeddings", e))?;

    Ok(Json(EmbeddingsResponse { embeddings }))
}

/// POST /embed-file/
///
/// Embeds the whole UTF-8 content of the `file` field as a single text.
/// Content past the tokenizer's limit is truncated, not chunked.
pub async fn embed_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FileEmbeddingResponse>, ApiError> {
    let embedder = state.embedder()?;

    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let content = String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)?;
    if content.trim().is_empty() {
        return Err(ApiError::EmptyContent);
    }

    tracing::debug!(
        "Embedding file {} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        content.len()
    );

    let vectors = state
        .pool()
        .run(move || embedder.embed(std::slice::from_ref(&content)))
        .await?
        .map_err(|e| ApiError::embedding("Error generating embeddings for file content", e))?;

    Ok(Json(FileEmbeddingResponse {
        file_name,
        embeddings: vectors.into_iter().next(),
    }))
}

/// GET /health/
///
/// Always 200; readiness is only reported in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, message) = if state.is_ready() {
        ("ok", "Model and tokenizer loaded successfully.")
    } else {
        (
            "loading",
            "Model and tokenizer are still loading or failed to load.",
        )
    };

    Json(HealthResponse {
        status: status.to_string(),
        message: message.to_string(),
    })
}

/// Read the first multipart field named `file` into memory.
async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await?;
            return Ok((file_name, bytes.to_vec()));
        }
    }
    Err(ApiError::MissingFile)
}
