//! `roachwatch-config` — runtime settings for the detection bridge.
//!
//! Provides:
//! - Typed settings with built-in defaults
//! - Optional TOML settings file
//! - Environment variable overrides
//! - Redacted snapshots for safe logging
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{apply_env, apply_process_env};
pub use io::load_settings_file;
pub use redact::redact;
pub use schema::Settings;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load defaults, then the optional settings file, then environment overrides.
///
/// This is the main entry point for loading settings at runtime.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => load_settings_file(path).await?,
        None => Settings::default(),
    };
    apply_process_env(&mut settings);
    Ok(settings)
}

/// Validate `settings` and log every warning and error found.
///
/// Call once the tracing subscriber is installed.
pub fn log_validation(settings: &Settings) -> ValidationReport {
    let report = validate(settings);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    report
}
