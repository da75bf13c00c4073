//! Detection endpoint
//!
//! `POST /api/DetectCockroach` takes the raw image as the request body and
//! answers with the classifier's JSON verbatim.

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use roachwatch_core::WatchError;
use tracing::{error, info, warn};

use crate::server::GatewayState;

pub const EMPTY_UPLOAD_MESSAGE: &str = "Please upload an image.";
pub const CONFIG_ERROR_MESSAGE: &str = "Server configuration error. Check App Configuration.";

/// Plain-text error response for a failed detection request.
pub struct DetectError(pub WatchError);

impl DetectError {
    pub fn message(&self) -> String {
        match &self.0 {
            WatchError::EmptyUpload => EMPTY_UPLOAD_MESSAGE.to_string(),
            WatchError::ConfigMissing(_) => CONFIG_ERROR_MESSAGE.to_string(),
            other => format!("An error occurred: {other}"),
        }
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        if self.0.is_precondition() {
            warn!(error = %self.0, "Detection request refused");
        } else {
            error!(error = %self.0, "Detection failed");
        }
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.message()).into_response()
    }
}

impl From<WatchError> for DetectError {
    fn from(err: WatchError) -> Self {
        Self(err)
    }
}

/// Handler for `POST /api/DetectCockroach`.
pub async fn detect_cockroach(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Response, DetectError> {
    if body.is_empty() {
        return Err(WatchError::EmptyUpload.into());
    }

    let Some(detector) = state.detector.as_ref() else {
        return Err(WatchError::ConfigMissing(state.missing.to_vec()).into());
    };

    info!("Received image payload of size {}", body.len());
    let output = detector.detect(body).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        output.raw,
    )
        .into_response())
}
