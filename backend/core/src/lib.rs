pub mod error;
pub mod event;
pub mod overlay;
pub mod traits;
pub mod types;

pub use error::WatchError;
pub use event::{DetectionEvent, DETECTION_PARTITION};
pub use overlay::{layout_boxes, OverlayBox, OverlayFilter, PROBABILITY_THRESHOLD, TARGET_TAG};
pub use traits::{BlobStore, InferenceClient, ResultStore};
pub use types::{image_blob_name, BoundingBox, InferenceOutput, Prediction};
