//! Content-addressed download cache.
//!
//! Artifacts live at `cache/<sha256>`. An entry only ever appears through an
//! atomic rename of a fully downloaded and verified temp file, so a present
//! entry is always complete and never re-verified.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::RUNNER_USER_AGENT;
use crate::digest::is_valid_hash;
use crate::error::{RemoteError, RemoteResult};
use crate::storage::StorageLayout;

/// Download attempts per `prepare` call on a cache miss.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct ArtifactCache {
    layout: StorageLayout,
    client: reqwest::Client,
}

impl ArtifactCache {
    pub fn new(layout: StorageLayout) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(RUNNER_USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { layout, client })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Where the artifact with this hash lives once cached.
    pub fn entry_path(&self, hash: &str) -> RemoteResult<PathBuf> {
        if !is_valid_hash(hash) {
            return Err(RemoteError::InvalidHash {
                hash: hash.to_string(),
            });
        }
        Ok(self.layout.cache_dir().join(hash))
    }

    /// Return the local path of the artifact, downloading it on a miss.
    ///
    /// Returns the last download error after [`DOWNLOAD_ATTEMPTS`] failures;
    /// nothing is left at the entry path in that case.
    pub async fn prepare(&self, url: &str, hash: &str) -> RemoteResult<PathBuf> {
        let target = self.entry_path(hash)?;

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(hash = %hash, "cache hit");
            return Ok(target);
        }

        let mut last_error = None;
        for attempt in 1..=DOWNLOAD_ATTEMPTS {
            match self.download(url, hash, &target).await {
                Ok(bytes) => {
                    info!(hash = %hash, bytes, attempt, "artifact cached");
                    return Ok(target);
                }
                Err(e) => {
                    warn!(hash = %hash, attempt, error = %e, "artifact download failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RemoteError::Cache {
            message: format!("failed to prepare {hash}"),
        }))
    }

    /// Stream `url` into a private temp file, hashing as it is written, and
    /// move it into place when the digest matches.
    async fn download(&self, url: &str, hash: &str, target: &Path) -> RemoteResult<u64> {
        let temp = tempfile::Builder::new()
            .prefix(&format!("download-{hash}-"))
            .tempfile_in(self.layout.tmp_dir())
            .map_err(|e| RemoteError::cache("failed to create temp file", e))?;
        // `temp_path` deletes the file on drop unless it is persisted.
        let (file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Network {
                message: format!("HTTP {} while downloading {}", status.as_u16(), url),
            });
        }

        let mut hasher = Sha256::new();
        let mut written = 0_u64;
        while let Some(chunk) = response.chunk().await? {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| RemoteError::cache("failed to write temp file", e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| RemoteError::cache("failed to flush temp file", e))?;
        drop(file);

        let actual = hex::encode(hasher.finalize());
        if actual != hash {
            return Err(RemoteError::DigestMismatch {
                expected: hash.to_string(),
                actual,
            });
        }

        temp_path
            .persist(target)
            .map_err(|e| RemoteError::cache("failed to move artifact into cache", e))?;
        Ok(written)
    }
}
