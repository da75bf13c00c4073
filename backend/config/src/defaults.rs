//! Default values for optional settings.

pub const BLOB_CONTAINER: &str = "uploaded-images";
pub const RESULTS_TABLE: &str = "DetectionResults";
pub const BIND_ADDRESS: &str = "0.0.0.0";
pub const PORT: u16 = 7071;
/// Largest image the prediction endpoint accepts.
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;
pub const LOG_DIR: &str = "logs";
pub const LOG_LEVEL: &str = "info";
