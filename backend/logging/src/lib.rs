//! Telemetry and structured logging for roachwatch.
//!
//! Handles log redaction, JSON output generation, file rotation, and detection pipeline event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DetectionLogEntry, DetectionLogEvent, DetectionLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
