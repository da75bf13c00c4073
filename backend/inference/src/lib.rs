pub mod custom_vision;

pub use custom_vision::{CustomVisionClient, PREDICTION_KEY_HEADER};
