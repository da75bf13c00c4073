use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::WatchError;
use crate::types::{typed_predictions, Prediction};

/// Partition label shared by every detection row.
pub const DETECTION_PARTITION: &str = "Detection";

/// An immutable record of one analysed upload.
/// Appended once per successful inference and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub partition_key: String,
    pub row_key: Uuid,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
    /// The upstream predictions list, JSON-encoded as received.
    pub predictions: String,
}

impl DetectionEvent {
    /// `predictions` is stored as given, so fields this crate does not model survive.
    pub fn new(image_url: impl Into<String>, predictions: &Value) -> Self {
        Self {
            partition_key: DETECTION_PARTITION.to_string(),
            row_key: Uuid::new_v4(),
            image_url: image_url.into(),
            timestamp: Utc::now(),
            predictions: predictions.to_string(),
        }
    }

    /// Decode the stored predictions column, skipping malformed entries.
    pub fn decode_predictions(&self) -> Result<Vec<Prediction>, WatchError> {
        let value: Value = serde_json::from_str(&self.predictions)?;
        Ok(typed_predictions(&value))
    }

    /// ISO-8601 timestamp with millisecond precision, as written to the table.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
