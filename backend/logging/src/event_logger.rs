//! Detection Event Logger
//!
//! One structured record per pipeline milestone, emitted under the
//! `detection_events` target so they land in the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionLogEvent {
    ImageUploaded {
        blob_name: String,
        image_url: String,
        size_bytes: usize,
    },
    InferenceCompleted {
        prediction_count: usize,
    },
    ResultRecorded {
        row_key: String,
    },
    RequestFailed {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct DetectionLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: DetectionLogEvent,
}

pub struct DetectionLogger;

impl DetectionLogger {
    /// Redacts the event's free-text fields and writes it to the tracing system.
    pub fn log_event(request_id: &str, mut event: DetectionLogEvent) -> DetectionLogEntry {
        match &mut event {
            DetectionLogEvent::ImageUploaded { image_url, .. } => {
                *image_url = redact_sensitive_data(image_url);
            }
            DetectionLogEvent::RequestFailed { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            DetectionLogEvent::InferenceCompleted { .. } | DetectionLogEvent::ResultRecorded { .. } => {}
        }

        let entry = DetectionLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry).unwrap_or_default();
        if matches!(entry.event, DetectionLogEvent::RequestFailed { .. }) {
            error!(target: "detection_events", event = %json, "Detection request failed");
        } else {
            info!(target: "detection_events", event = %json, "Detection pipeline event");
        }
        entry
    }
}
