//! Repositories this workspace depends on.

/// Repository the embedding service loads at startup.
pub const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Repositories `model-fetch` materializes, in download order.
///
/// Every entry must be loaded by something in the workspace; each repository
/// is mirrored whole, ONNX and TF variants included.
pub const REPOS_TO_DOWNLOAD: &[&str] = &[MODEL_NAME];

/// Hugging Face Hub host.
pub const HF_ENDPOINT: &str = "https://huggingface.co";
