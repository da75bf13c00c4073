//! Gateway Health API

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub configured: bool,
    pub missing: Vec<String>,
}

/// Handler for `GET /api/health`.
///
/// The process is up either way; `degraded` means detection requests will be
/// refused until the missing settings are supplied.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let configured = state.detector.is_some();
    Json(HealthReport {
        status: if configured { "ok" } else { "degraded" },
        service: "roachwatch",
        version: env!("CARGO_PKG_VERSION"),
        configured,
        missing: state.missing.to_vec(),
    })
}
