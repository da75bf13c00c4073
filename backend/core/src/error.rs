use thiserror::Error;

/// Top-level error type for a detection request.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    #[error("request body is empty")]
    EmptyUpload,

    #[error("Custom Vision API failed with status {status}")]
    Inference { status: u16, body: String },

    #[error("blob storage error: {0}")]
    Blob(String),

    #[error("table storage error: {0}")]
    Table(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchError {
    /// HTTP status the handler answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WatchError::EmptyUpload => 400,
            _ => 500,
        }
    }

    /// Whether the error was raised before any external service was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(self, WatchError::ConfigMissing(_) | WatchError::EmptyUpload)
    }
}
