//! Shared fixture: the real checkpoint, loaded once per test binary.
//!
//! Point `SEMANTIC_EMBEDDINGS_MODEL_DIR` at a materialized checkpoint, or run
//! `model-fetch` first so the default cache location is populated.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use semantic_embeddings::SemanticEmbeddings;

fn model_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SEMANTIC_EMBEDDINGS_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").expect("HOME is not set");
    PathBuf::from(home).join(".cache/huggingface/local/sentence-transformers--all-MiniLM-L6-v2")
}

pub static TEST_MODEL: Lazy<SemanticEmbeddings> = Lazy::new(|| {
    SemanticEmbeddings::load_model_from_dir(&model_dir()).expect("Failed to load test model")
});
