//! `roachwatch serve`

use std::sync::Arc;

use anyhow::Result;
use roachwatch_config::{log_validation, Settings};
use roachwatch_gateway::{build_router, start_server, Detector, GatewayOptions, GatewayState};
use roachwatch_inference::CustomVisionClient;
use roachwatch_storage::{open_backends, StorageOptions};
use tracing::{info, warn};

pub async fn run(settings: Settings) -> Result<()> {
    info!(
        addr = %settings.listen_addr(),
        settings = %settings.redacted(),
        "Starting roachwatch"
    );
    log_validation(&settings);

    let (state, media_dir) = build_state(&settings).await?;
    let app = build_router(
        state,
        GatewayOptions {
            media_dir,
            max_upload_bytes: settings.max_upload_bytes,
        },
    );
    start_server(&settings.listen_addr(), app).await
}

/// Wire the adapters when every required setting is present.
///
/// With settings missing the server still starts, answers health checks and
/// refuses detection requests.
async fn build_state(settings: &Settings) -> Result<(GatewayState, Option<std::path::PathBuf>)> {
    let (Some(url), Some(key), Some(connection_string)) = (
        present(&settings.custom_vision_url),
        present(&settings.custom_vision_key),
        present(&settings.storage_connection_string),
    ) else {
        let missing = settings.missing_required();
        warn!(?missing, "Detection disabled until the missing settings are provided");
        return Ok((GatewayState::unconfigured(missing), None));
    };

    let public_url = settings.public_url();
    let backends = open_backends(&StorageOptions {
        connection_string,
        blob_container: &settings.blob_container,
        results_table: &settings.results_table,
        public_url: &public_url,
    })?;
    info!(
        blob = backends.blob.name(),
        results = backends.results.name(),
        "Storage backends ready"
    );

    let detector = Detector::new(
        backends.blob,
        Arc::new(CustomVisionClient::new(url, key)),
        backends.results,
    );
    if let Err(e) = detector.prepare().await {
        warn!(error = %e, "Could not prepare storage; uploads may fail");
    }

    Ok((GatewayState::configured(detector), backends.media_dir))
}

/// A set, non-blank value.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
