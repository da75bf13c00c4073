/// Object detection through a published Custom Vision iteration.
///
/// The image is posted as a raw octet stream to the iteration's prediction
/// URL, authenticated with the `Prediction-Key` header.
use async_trait::async_trait;
use bytes::Bytes;
use logging::redact_sensitive_data;
use roachwatch_core::{InferenceClient, InferenceOutput, WatchError};
use tracing::{error, info};

pub const PREDICTION_KEY_HEADER: &str = "Prediction-Key";

pub struct CustomVisionClient {
    http: reqwest::Client,
    endpoint: String,
    prediction_key: String,
}

impl CustomVisionClient {
    pub fn new(endpoint: impl Into<String>, prediction_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, prediction_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        prediction_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            prediction_key: prediction_key.into(),
        }
    }
}

#[async_trait]
impl InferenceClient for CustomVisionClient {
    fn name(&self) -> &str {
        "custom-vision"
    }

    async fn predict(&self, image: Bytes) -> Result<InferenceOutput, WatchError> {
        info!("[Vision] Submitting {} bytes to Custom Vision", image.len());
        let resp = self
            .http
            .post(&self.endpoint)
            .header(PREDICTION_KEY_HEADER, &self.prediction_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| WatchError::Http(format!("Custom Vision request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body = %redact_sensitive_data(&body),
                "Custom Vision API failed"
            );
            return Err(WatchError::Inference {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp
            .bytes()
            .await
            .map_err(|e| WatchError::Http(format!("Failed to read Custom Vision response: {e}")))?;
        let output = InferenceOutput::parse(raw)?;
        info!("[Vision] Received {} predictions", output.predictions.len());
        Ok(output)
    }
}
