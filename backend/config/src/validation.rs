//! Settings validation with user-friendly messages.

use crate::schema::{Settings, CUSTOM_VISION_URL};
use thiserror::Error;

/// A validation problem with the setting it concerns.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the settings and return a report of all errors and warnings.
pub fn validate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_required(settings, &mut report);
    validate_inference_url(settings, &mut report);
    validate_names(settings, &mut report);
    validate_limits(settings, &mut report);
    report
}

fn validate_required(settings: &Settings, report: &mut ValidationReport) {
    for name in settings.missing_required() {
        report.error(name, "Required setting is not set; detection requests will fail");
    }
}

fn validate_inference_url(settings: &Settings, report: &mut ValidationReport) {
    let Some(url) = settings.custom_vision_url.as_deref() else { return };
    if url.trim().is_empty() {
        return;
    }
    if url.starts_with("http://") {
        report.warn(CUSTOM_VISION_URL, "Prediction key will be sent over plain http");
    } else if !url.starts_with("https://") {
        report.error(CUSTOM_VISION_URL, format!("Not an http(s) URL: {url}"));
    }
}

/// Container and table names follow the storage service naming rules.
fn validate_names(settings: &Settings, report: &mut ValidationReport) {
    let container = &settings.blob_container;
    let container_ok = (3..=63).contains(&container.len())
        && container.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !container.starts_with('-')
        && !container.ends_with('-')
        && !container.contains("--");
    if !container_ok {
        report.error(
            "blob_container",
            "Must be 3-63 lowercase letters, digits or single hyphens",
        );
    }

    let table = &settings.results_table;
    let table_ok = (3..=63).contains(&table.len())
        && table.chars().all(|c| c.is_ascii_alphanumeric())
        && table.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !table_ok {
        report.error("results_table", "Must be 3-63 alphanumeric characters starting with a letter");
    }
}

fn validate_limits(settings: &Settings, report: &mut ValidationReport) {
    if settings.max_upload_bytes == 0 {
        report.error("max_upload_bytes", "Must be > 0");
    } else if settings.max_upload_bytes > crate::defaults::MAX_UPLOAD_BYTES {
        report.warn(
            "max_upload_bytes",
            "Larger than the prediction endpoint accepts; big uploads will fail upstream",
        );
    }
    if settings.port == 0 {
        report.warn("port", "Port 0 binds a random port");
    }
}
