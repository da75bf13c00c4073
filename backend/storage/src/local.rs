//! Filesystem blob store, served back through the gateway's `/images` route.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use roachwatch_core::{BlobStore, WatchError};
use tokio::fs;
use tracing::debug;

pub struct LocalBlobStore {
    dir: PathBuf,
    /// Base URL the stored files are reachable under (no trailing slash).
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(dir: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn prepare(&self) -> Result<(), WatchError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| WatchError::Blob(format!("failed to create {}: {e}", self.dir.display())))
    }

    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, WatchError> {
        if blob_name.is_empty() || blob_name.contains(['/', '\\']) || blob_name.contains("..") {
            return Err(WatchError::Blob(format!("invalid blob name '{blob_name}'")));
        }
        self.prepare().await?;

        let path = self.dir.join(blob_name);
        fs::write(&path, &data)
            .await
            .map_err(|e| WatchError::Blob(format!("failed to write {}: {e}", path.display())))?;
        debug!(path = %path.display(), size = data.len(), "Stored image locally");

        Ok(format!("{}/{}", self.base_url, blob_name))
    }
}
