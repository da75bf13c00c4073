//! Detection pipeline: store the image, classify it, record the result.
//!
//! The three adapter calls run strictly in sequence and each happens at most
//! once. A failing step stops the pipeline; earlier side effects stay.

use std::sync::Arc;

use bytes::Bytes;
use logging::{DetectionLogEvent, DetectionLogger};
use roachwatch_core::{
    BlobStore, DetectionEvent, InferenceClient, InferenceOutput, ResultStore, WatchError,
    image_blob_name,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub struct Detector {
    blob: Arc<dyn BlobStore>,
    inference: Arc<dyn InferenceClient>,
    results: Arc<dyn ResultStore>,
}

impl Detector {
    pub fn new(
        blob: Arc<dyn BlobStore>,
        inference: Arc<dyn InferenceClient>,
        results: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            blob,
            inference,
            results,
        }
    }

    /// Create the container and table where the backends need them.
    pub async fn prepare(&self) -> Result<(), WatchError> {
        self.blob.prepare().await?;
        self.results.prepare().await
    }

    /// Run one image through the pipeline and return the inference output.
    #[instrument(skip_all, fields(size = image.len()))]
    pub async fn detect(&self, image: Bytes) -> Result<InferenceOutput, WatchError> {
        if image.is_empty() {
            return Err(WatchError::EmptyUpload);
        }

        let request_id = Uuid::new_v4().to_string();
        let result = self.run(&request_id, image).await;
        if let Err(e) = &result {
            DetectionLogger::log_event(
                &request_id,
                DetectionLogEvent::RequestFailed {
                    error_msg: e.to_string(),
                },
            );
        }
        result
    }

    async fn run(&self, request_id: &str, image: Bytes) -> Result<InferenceOutput, WatchError> {
        let blob_name = image_blob_name();
        let size_bytes = image.len();
        debug!(blob = %blob_name, backend = self.blob.name(), "Uploading image");
        let image_url = self.blob.upload(&blob_name, image.clone()).await?;
        DetectionLogger::log_event(
            request_id,
            DetectionLogEvent::ImageUploaded {
                blob_name,
                image_url: image_url.clone(),
                size_bytes,
            },
        );

        let output = self.inference.predict(image).await?;
        let prediction_count = output.raw_count();
        if output.predictions.len() < prediction_count {
            warn!(
                total = prediction_count,
                readable = output.predictions.len(),
                "Some predictions lack a tag or probability; stored as received"
            );
        }
        DetectionLogger::log_event(
            request_id,
            DetectionLogEvent::InferenceCompleted { prediction_count },
        );

        let event = DetectionEvent::new(image_url, &output.raw_predictions);
        self.results.append(&event).await?;
        DetectionLogger::log_event(
            request_id,
            DetectionLogEvent::ResultRecorded {
                row_key: event.row_key.to_string(),
            },
        );

        Ok(output)
    }
}
