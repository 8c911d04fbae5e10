//! Layout of the local artifact cache.
//!
//! Each repository lives in its own plain directory under the cache root,
//! `org/name` becoming `org--name`. Files are regular files, never symlinks
//! into a blob store, so the tree can be copied into a container as-is.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ModelCache {
    root: PathBuf,
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.cache/huggingface/local` for the invoking user.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        Ok(Self::new(home.join(".cache").join("huggingface").join("local")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the materialized files of `repo_id`.
    pub fn repo_dir(&self, repo_id: &str) -> PathBuf {
        self.root.join(repo_id.replace('/', "--"))
    }
}
