//! Bounding-box overlay geometry.
//!
//! Turns normalized prediction boxes into pixel rectangles and labels for an
//! image displayed at a given size. The browser client draws the same layout on
//! its canvas; the CLI uses it to annotate images.

use serde::Serialize;

use crate::types::Prediction;

/// Tag drawn by default.
pub const TARGET_TAG: &str = "cockroach";

/// Predictions must score strictly above this to be drawn.
pub const PROBABILITY_THRESHOLD: f64 = 0.5;

/// Labels never start above this y coordinate.
const MIN_LABEL_Y: f64 = 10.0;

/// Gap between a label's baseline and the top edge of its box.
const LABEL_GAP: f64 = 5.0;

/// Which predictions make it onto the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFilter {
    pub tag: String,
    pub threshold: f64,
}

impl Default for OverlayFilter {
    fn default() -> Self {
        Self {
            tag: TARGET_TAG.to_string(),
            threshold: PROBABILITY_THRESHOLD,
        }
    }
}

impl OverlayFilter {
    pub fn accepts(&self, prediction: &Prediction) -> bool {
        prediction.tag_name == self.tag && prediction.probability > self.threshold
    }
}

/// A rectangle and its label in display pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
}

/// Lay out every accepted prediction on an image displayed at
/// `display_width` x `display_height` pixels.
///
/// Horizontal values scale by the width and vertical values by the height,
/// independently, so a distorted display distorts the boxes the same way.
pub fn layout_boxes(
    predictions: &[Prediction],
    display_width: f64,
    display_height: f64,
    filter: &OverlayFilter,
) -> Vec<OverlayBox> {
    predictions
        .iter()
        .filter(|p| filter.accepts(p))
        .filter_map(|p| {
            let bbox = p.bounding_box?;
            let x = bbox.left * display_width;
            let y = bbox.top * display_height;
            Some(OverlayBox {
                x,
                y,
                width: bbox.width * display_width,
                height: bbox.height * display_height,
                label: label_for(p),
                label_x: x,
                label_y: if y > MIN_LABEL_Y { y - LABEL_GAP } else { MIN_LABEL_Y },
            })
        })
        .collect()
}

/// `"<tag> (<percent>%)"` with the probability rounded to a whole percent.
pub fn label_for(prediction: &Prediction) -> String {
    format!(
        "{} ({}%)",
        prediction.tag_name,
        (prediction.probability * 100.0).round() as i64
    )
}
