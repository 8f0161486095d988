//! Local cache of model files fetched from the Hugging Face Hub.
//!
//! Files live under `<cache_dir>/vidbrief/models/models--<org>--<name>/`. A
//! configured model directory bypasses the cache and is never written to.

use crate::error::{Result, VidbriefError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const HUB_BASE_URL: &str = "https://huggingface.co";

/// Files a BERT-style sentence embedding model needs.
pub const MODEL_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Where model files are found or downloaded to.
#[derive(Debug, Clone)]
pub struct ModelCache {
    root: PathBuf,
    timeout: Duration,
}

impl ModelCache {
    /// Cache under the platform cache directory.
    pub fn new(timeout: Duration) -> Result<Self> {
        let root = dirs::cache_dir()
            .map(|dir| dir.join("vidbrief").join("models"))
            .ok_or_else(|| {
                VidbriefError::EmbeddingUnavailable(
                    "Could not determine a cache directory for models".to_string(),
                )
            })?;
        Ok(Self::with_root(root, timeout))
    }

    pub fn with_root(root: PathBuf, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    /// Directory holding the files of `repo_id`.
    pub fn model_dir(&self, repo_id: &str) -> PathBuf {
        self.root.join(format!("models--{}", repo_id.replace('/', "--")))
    }

    /// Return a directory containing every file in [`MODEL_FILES`],
    /// downloading whatever is missing.
    pub async fn fetch(&self, repo_id: &str) -> Result<PathBuf> {
        let dir = self.model_dir(repo_id);
        tokio::fs::create_dir_all(&dir).await?;

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        for file in MODEL_FILES {
            let target = dir.join(file);
            if target.exists() {
                debug!("Using cached {}", target.display());
                continue;
            }
            info!("Downloading {} from {}", file, repo_id);
            download_with_retry(&client, &file_url(repo_id, file), &target).await?;
        }

        Ok(dir)
    }
}

/// Check that an explicitly configured model directory is complete.
pub fn verify_model_dir(dir: &Path) -> Result<()> {
    let missing: Vec<&str> = MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !dir.join(file).is_file())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(VidbriefError::EmbeddingUnavailable(format!(
            "Model directory {} is missing {}",
            dir.display(),
            missing.join(", ")
        )))
    }
}

fn file_url(repo_id: &str, file: &str) -> String {
    format!("{}/{}/resolve/main/{}", HUB_BASE_URL, repo_id, file)
}

async fn download_with_retry(client: &reqwest::Client, url: &str, target: &Path) -> Result<()> {
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut attempt = 1;
    loop {
        match download(client, url, target).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_ATTEMPTS && is_retryable(&e) => {
                warn!("Download of {} failed (attempt {}): {}", url, attempt, e);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_retryable(error: &VidbriefError) -> bool {
    match error {
        VidbriefError::Http(e) => match e.status() {
            Some(status) => status.is_server_error() || status.as_u16() == 429,
            None => true,
        },
        VidbriefError::Io(_) => true,
        _ => false,
    }
}

/// Stream `url` into a partial file next to `target`, then move it into place.
async fn download(client: &reqwest::Client, url: &str, target: &Path) -> Result<()> {
    let mut response = client.get(url).send().await?.error_for_status()?;

    let partial = target.with_extension("partial");
    let mut file = tokio::fs::File::create(&partial).await?;
    while let Some(bytes) = response.chunk().await? {
        file.write_all(&bytes).await?;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, target).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dir_layout() {
        let cache = ModelCache::with_root(PathBuf::from("/cache"), Duration::from_secs(1));
        assert_eq!(
            cache.model_dir("sentence-transformers/all-MiniLM-L6-v2"),
            PathBuf::from("/cache/models--sentence-transformers--all-MiniLM-L6-v2")
        );
    }

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url("sentence-transformers/all-MiniLM-L6-v2", "config.json"),
            "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/config.json"
        );
    }

    #[test]
    fn test_verify_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = verify_model_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("model.safetensors"));

        for file in MODEL_FILES {
            std::fs::write(dir.path().join(file), b"{}").unwrap();
        }
        assert!(verify_model_dir(dir.path()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_uses_cached_files() {
        let root = tempfile::tempdir().unwrap();
        let cache = ModelCache::with_root(root.path().to_path_buf(), Duration::from_secs(1));
        let dir = cache.model_dir("org/model");
        std::fs::create_dir_all(&dir).unwrap();
        for file in MODEL_FILES {
            std::fs::write(dir.join(file), b"cached").unwrap();
        }

        assert_eq!(cache.fetch("org/model").await.unwrap(), dir);
    }
}
