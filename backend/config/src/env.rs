//! Environment variable overrides for settings.
//!
//! Every setting can be supplied through the environment; a non-empty variable
//! wins over the settings file and the defaults. Unparseable numbers are
//! logged and ignored.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use crate::schema::{Settings, CUSTOM_VISION_KEY, CUSTOM_VISION_URL, STORAGE_CONNECTION_STRING};

pub const BLOB_CONTAINER: &str = "BLOB_CONTAINER";
pub const RESULTS_TABLE: &str = "RESULTS_TABLE";
pub const BIND: &str = "ROACHWATCH_BIND";
pub const PORT: &str = "ROACHWATCH_PORT";
pub const PUBLIC_URL: &str = "ROACHWATCH_PUBLIC_URL";
pub const MAX_UPLOAD_BYTES: &str = "ROACHWATCH_MAX_UPLOAD_BYTES";
pub const LOG_DIR: &str = "ROACHWATCH_LOG_DIR";
pub const LOG_LEVEL: &str = "RUST_LOG";
/// Path of an optional TOML settings file.
pub const CONFIG_PATH: &str = "ROACHWATCH_CONFIG";

/// Overlay the current process environment onto `settings`.
pub fn apply_process_env(settings: &mut Settings) {
    apply_env(settings, &std::env::vars().collect());
}

/// Overlay variables from `env` onto `settings` (useful for testing).
pub fn apply_env(settings: &mut Settings, env: &HashMap<String, String>) {
    let get = |name: &str| {
        env.get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(v) = get(CUSTOM_VISION_URL) {
        settings.custom_vision_url = Some(v);
    }
    if let Some(v) = get(CUSTOM_VISION_KEY) {
        settings.custom_vision_key = Some(v);
    }
    if let Some(v) = get(STORAGE_CONNECTION_STRING) {
        settings.storage_connection_string = Some(v);
    }
    if let Some(v) = get(BLOB_CONTAINER) {
        settings.blob_container = v;
    }
    if let Some(v) = get(RESULTS_TABLE) {
        settings.results_table = v;
    }
    if let Some(v) = get(BIND) {
        settings.bind_address = v;
    }
    if let Some(v) = get(PUBLIC_URL) {
        settings.public_url = Some(v);
    }
    if let Some(v) = get(LOG_DIR) {
        settings.log_dir = v;
    }
    if let Some(v) = get(LOG_LEVEL) {
        settings.log_level = v;
    }
    if let Some(port) = parse_var(PORT, get(PORT)) {
        settings.port = port;
    }
    if let Some(limit) = parse_var(MAX_UPLOAD_BYTES, get(MAX_UPLOAD_BYTES)) {
        settings.max_upload_bytes = limit;
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}
