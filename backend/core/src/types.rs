use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::WatchError;

/// Region of an image, expressed as fractions of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One labelled, scored detection returned by the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    pub tag_name: String,
    pub probability: f64,
    /// Absent for classification-only projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Prediction {
    pub fn new(tag_name: impl Into<String>, probability: f64, bounding_box: BoundingBox) -> Self {
        Self {
            tag_id: None,
            tag_name: tag_name.into(),
            probability,
            bounding_box: Some(bounding_box),
        }
    }
}

#[derive(Deserialize)]
struct PredictionEnvelope {
    #[serde(default)]
    predictions: Value,
}

/// A successful inference response: the upstream bytes plus the predictions.
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    /// Response body exactly as the inference service sent it.
    pub raw: Bytes,
    /// The upstream `predictions` value untouched, `[]` when missing or null.
    /// This is what gets stored.
    pub raw_predictions: Value,
    /// The elements of `raw_predictions` that carry a tag and a probability.
    pub predictions: Vec<Prediction>,
}

impl InferenceOutput {
    /// Parse an inference response body. A missing or null `predictions`
    /// field yields an empty list; a body that is not JSON is an error.
    pub fn parse(raw: Bytes) -> Result<Self, WatchError> {
        let envelope: PredictionEnvelope = serde_json::from_slice(&raw)?;
        let raw_predictions = match envelope.predictions {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        Ok(Self {
            predictions: typed_predictions(&raw_predictions),
            raw,
            raw_predictions,
        })
    }

    /// Number of entries in the upstream predictions list.
    pub fn raw_count(&self) -> usize {
        self.raw_predictions.as_array().map_or(0, Vec::len)
    }
}

/// Read the well-formed predictions out of an upstream `predictions` value.
///
/// Elements that do not look like a prediction are skipped, as is anything
/// that is not an array.
pub fn typed_predictions(value: &Value) -> Vec<Prediction> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| Prediction::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Generate a fresh, globally unique name for an uploaded image.
pub fn image_blob_name() -> String {
    format!("{}.jpg", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM_VISION_BODY: &str = r#"{
        "id": "7796df8e-acbc-45fc-90b4-1b0c81b73639",
        "project": "3c3b3b4d-0000-0000-0000-000000000000",
        "iteration": "Iteration3",
        "created": "2024-05-02T10:11:12.000Z",
        "predictions": [
            {
                "probability": 0.76,
                "tagId": "b5f7e6a8-0000-0000-0000-000000000000",
                "tagName": "cockroach",
                "boundingBox": { "left": 0.1, "top": 0.2, "width": 0.3, "height": 0.4 }
            },
            { "probability": 0.12, "tagName": "floor" }
        ]
    }"#;

    #[test]
    fn parses_custom_vision_payload() {
        let output = InferenceOutput::parse(Bytes::from_static(CUSTOM_VISION_BODY.as_bytes())).unwrap();
        assert_eq!(output.predictions.len(), 2);

        let first = &output.predictions[0];
        assert_eq!(first.tag_name, "cockroach");
        assert_eq!(first.tag_id.as_deref(), Some("b5f7e6a8-0000-0000-0000-000000000000"));
        assert_eq!(
            first.bounding_box,
            Some(BoundingBox { left: 0.1, top: 0.2, width: 0.3, height: 0.4 })
        );
        assert!(output.predictions[1].bounding_box.is_none());
        assert_eq!(output.raw, CUSTOM_VISION_BODY.as_bytes());
    }

    #[test]
    fn missing_predictions_default_to_empty() {
        let output = InferenceOutput::parse(Bytes::from_static(br#"{"id":"x"}"#)).unwrap();
        assert!(output.predictions.is_empty());

        let output = InferenceOutput::parse(Bytes::from_static(br#"{"predictions":null}"#)).unwrap();
        assert!(output.predictions.is_empty());
        assert_eq!(output.raw_predictions, serde_json::json!([]));
    }

    #[test]
    fn odd_elements_are_kept_raw_but_not_typed() {
        let body = br#"{"predictions":[{"probability":0.9,"tagId":"t"},{"probability":0.8,"tagName":"cockroach","tagType":"Regular"}]}"#;
        let output = InferenceOutput::parse(Bytes::from_static(body)).unwrap();
        assert_eq!(output.raw_count(), 2);
        assert_eq!(output.predictions.len(), 1);
        assert_eq!(output.predictions[0].tag_name, "cockroach");
        assert_eq!(output.raw_predictions[1]["tagType"], "Regular");
    }

    #[test]
    fn non_array_predictions_have_no_typed_entries() {
        let output = InferenceOutput::parse(Bytes::from_static(br#"{"predictions":{"odd":1}}"#)).unwrap();
        assert!(output.predictions.is_empty());
        assert_eq!(output.raw_count(), 0);
        assert_eq!(output.raw_predictions["odd"], 1);
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = InferenceOutput::parse(Bytes::from_static(b"<html>bad gateway</html>")).unwrap_err();
        assert!(matches!(err, WatchError::Serialization(_)));
    }

    #[test]
    fn blob_names_are_unique_jpegs() {
        let a = image_blob_name();
        let b = image_blob_name();
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(Uuid::parse_str(a.trim_end_matches(".jpg")).is_ok());
    }
}
