//! HTTP-facing errors.
//!
//! Every error renders as `{"detail": "..."}` with a status chosen by its
//! cause: readiness (503), client input (4xx), inference (500).

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use semantic_embeddings::EmbeddingError;
use serde_json::json;
use thiserror::Error;

use crate::pool::PoolError;

/// Error returned by every handler.
///
/// Tokenizer rejections are the caller's input and answer 400; only
/// failures inside the model or its worker answer 500. Clients that treated
/// every embedding failure as a 500 now see 400 for tokenizer rejections.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model is not loaded yet. Please try again later.")]
    NotReady,

    #[error("Inference queue is full. Please try again later.")]
    Busy,

    #[error("Could not decode file content as UTF-8. Please ensure it's a valid text file.")]
    InvalidUtf8,

    #[error("File content is empty or contains only whitespace.")]
    EmptyContent,

    #[error("Missing multipart field 'file'.")]
    MissingFile,

    #[error("Error reading file: {0}")]
    Upload(#[from] MultipartError),

    /// 400, not 500: the input could not be tokenized.
    #[error("Error tokenizing input: {0}")]
    Tokenization(String),

    #[error("{context}: {source}")]
    Inference {
        context: &'static str,
        #[source]
        source: EmbeddingError,
    },

    #[error("Inference worker failed: {0}")]
    Worker(String),
}

impl ApiError {
    /// Classify an embedding failure; `context` prefixes inference errors.
    pub fn embedding(context: &'static str, err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Tokenization(message) => ApiError::Tokenization(message),
            source => ApiError::Inference { context, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady | ApiError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidUtf8 | ApiError::EmptyContent | ApiError::Tokenization(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload(err) => err.status(),
            ApiError::Inference { .. } | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Busy => ApiError::Busy,
            PoolError::Worker(join_error) => ApiError::Worker(join_error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("{}", detail);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", detail);
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
