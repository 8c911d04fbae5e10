//! Download pretrained model repositories into a local artifact cache.
//!
//! This crate handles:
//! - The fixed list of repositories the service depends on
//! - Where each repository lives on disk
//! - Listing and downloading every file of a repository
//! - The failure lines the CLI prints

pub mod cache;
pub mod fetch;
pub mod report;
pub mod repos;

pub use cache::ModelCache;
pub use fetch::{FetchError, Fetcher};
pub use report::{download_headline, write_failure, REMEDIATION_HINT};
pub use repos::{HF_ENDPOINT, MODEL_NAME, REPOS_TO_DOWNLOAD};
