//! Repository downloads from the Hugging Face Hub.

use std::path::{Component, Path, PathBuf};

use futures_util::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::cache::ModelCache;

/// A failed fetch. Every variant names the repository it happened in.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not list repository files: {source}")]
    Listing {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not download {file}: {source}")]
    Download {
        repo: String,
        file: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("repository lists a file outside its own directory: {file}")]
    UnsafePath { repo: String, file: String },

    #[error("{}: {source}", path.display())]
    Io {
        repo: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Repository the failure belongs to, if any.
    pub fn repo(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Listing { repo, .. }
            | FetchError::Download { repo, .. }
            | FetchError::UnsafePath { repo, .. }
            | FetchError::Io { repo, .. } => Some(repo),
        }
    }
}

/// Repository metadata returned by `/api/models/{repo}`.
#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
struct Sibling {
    rfilename: String,
}

/// Downloads whole repositories into a [`ModelCache`].
///
/// Runs strictly one file at a time. There is no retry and no locking
/// against another fetcher writing the same cache.
pub struct Fetcher {
    client: reqwest::Client,
    cache: ModelCache,
    endpoint: String,
}

impl Fetcher {
    pub fn new(cache: ModelCache, endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            cache,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Every file path the hub lists for `repo_id`.
    pub async fn list_files(&self, repo_id: &str) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/api/models/{}", self.endpoint, repo_id);
        let listing_error = |source| FetchError::Listing {
            repo: repo_id.to_string(),
            source,
        };

        let info: RepoInfo = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(listing_error)?
            .json()
            .await
            .map_err(listing_error)?;

        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Download every file of `repo_id`, replacing any earlier copy.
    ///
    /// The file list is fetched before anything on disk is touched, so an
    /// unreachable hub leaves an existing copy intact. Returns the
    /// repository directory.
    pub async fn download_repo(&self, repo_id: &str) -> Result<PathBuf, FetchError> {
        let files = self.list_files(repo_id).await?;
        for file in &files {
            if !is_relative_inside(file) {
                return Err(FetchError::UnsafePath {
                    repo: repo_id.to_string(),
                    file: file.clone(),
                });
            }
        }

        let repo_dir = self.cache.repo_dir(repo_id);
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| FetchError::Io {
                repo: repo_id.to_string(),
                path,
                source,
            }
        };

        if fs::try_exists(&repo_dir).await.map_err(io_error(&repo_dir))? {
            tracing::debug!("Removing previous copy at {}", repo_dir.display());
            fs::remove_dir_all(&repo_dir)
                .await
                .map_err(io_error(&repo_dir))?;
        }
        fs::create_dir_all(&repo_dir)
            .await
            .map_err(io_error(&repo_dir))?;

        tracing::info!("{} has {} files", repo_id, files.len());

        for file in &files {
            let dest = repo_dir.join(file);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).await.map_err(io_error(parent))?;
            }

            let url = format!("{}/{}/resolve/main/{}", self.endpoint, repo_id, file);
            tracing::info!("Downloading {}...", file);
            self.download_file(repo_id, file, &url, &dest).await?;
        }

        Ok(repo_dir)
    }

    /// Download `repo_ids` in order, stopping at the first failure.
    ///
    /// Repositories after the failing one are not contacted.
    pub async fn download_all(&self, repo_ids: &[&str]) -> Result<Vec<PathBuf>, FetchError> {
        let mut paths = Vec::with_capacity(repo_ids.len());
        for repo_id in repo_ids {
            println!("\nDownloading {}...", repo_id);
            let path = self.download_repo(repo_id).await?;
            println!("Successfully downloaded {} to: {}", repo_id, path.display());
            paths.push(path);
        }
        Ok(paths)
    }

    /// Stream a single file to `dest`.
    async fn download_file(
        &self,
        repo_id: &str,
        file: &str,
        url: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        let download_error = |source| FetchError::Download {
            repo: repo_id.to_string(),
            file: file.to_string(),
            source,
        };
        let io_error = |source| FetchError::Io {
            repo: repo_id.to_string(),
            path: dest.to_path_buf(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(download_error)?;

        let total_size = response.content_length();
        let mut stream = response.bytes_stream();

        let mut out = File::create(dest).await.map_err(io_error)?;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(download_error)?;
            out.write_all(&chunk).await.map_err(io_error)?;
            downloaded += chunk.len() as u64;

            // Log progress for large files
            if let Some(total) = total_size {
                if total > 1_000_000 && downloaded % 10_000_000 < chunk.len() as u64 {
                    let percent = (downloaded as f64 / total as f64) * 100.0;
                    tracing::info!("  Progress: {:.1}%", percent);
                }
            }
        }

        out.flush().await.map_err(io_error)?;
        Ok(())
    }
}

/// True when `file` names a path strictly inside the repository directory.
fn is_relative_inside(file: &str) -> bool {
    let path = Path::new(file);
    !file.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
