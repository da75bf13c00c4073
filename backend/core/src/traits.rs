use async_trait::async_trait;
use bytes::Bytes;

use crate::error::WatchError;
use crate::event::DetectionEvent;
use crate::types::InferenceOutput;

/// Write-once object storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Backend name used in logs (e.g., "azure-blob", "local").
    fn name(&self) -> &str;

    /// Create the target container if the backend needs it. Safe to repeat.
    async fn prepare(&self) -> Result<(), WatchError> {
        Ok(())
    }

    /// Store `data` under `blob_name` and return a URL the image can be fetched from.
    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, WatchError>;
}

/// Client for the hosted image-classification service.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    fn name(&self) -> &str;

    /// Submit raw image bytes and return the parsed response.
    ///
    /// A non-success upstream status is reported as [`WatchError::Inference`].
    async fn predict(&self, image: Bytes) -> Result<InferenceOutput, WatchError>;
}

/// Append-only table of detection events.
#[async_trait]
pub trait ResultStore: Send + Sync {
    fn name(&self) -> &str;

    /// Create the target table if the backend needs it. Safe to repeat.
    async fn prepare(&self) -> Result<(), WatchError> {
        Ok(())
    }

    /// Insert one new row for `event`.
    async fn append(&self, event: &DetectionEvent) -> Result<(), WatchError>;
}
