//! Settings file loading.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::schema::Settings;

/// Load and parse a TOML settings file.
///
/// Returns `Ok(Settings::default())` if the file doesn't exist.
pub async fn load_settings_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "Settings file does not exist; using defaults");
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let settings: Settings = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse settings TOML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}
