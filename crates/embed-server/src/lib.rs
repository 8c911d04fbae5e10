//! HTTP service that turns text into embedding vectors.
//!
//! Provides:
//! - `POST /embed/` for a list of texts
//! - `POST /embed-file/` for one uploaded text file
//! - `GET /health/` for readiness

pub mod embedder;
pub mod error;
pub mod pool;
pub mod routes;
pub mod shutdown;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use embedder::Embedder;
pub use error::ApiError;
pub use pool::InferencePool;
pub use shutdown::{wait_for_shutdown, ShutdownReason};
pub use state::{load_embedder, AppState};

/// Build the service router.
///
/// `max_upload_bytes` caps request bodies, uploads included.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/embed/", post(routes::embed_texts))
        .route("/embed-file/", post(routes::embed_file))
        .route("/health/", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
