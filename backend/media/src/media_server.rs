//! Local image server: serves images written by the local blob store.
//!
//! Provides a simple Axum router that serves stored images by name, labelled
//! with the content type sniffed from the file itself.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::{path::PathBuf, sync::Arc};
use tokio::fs;
use tracing::{debug, warn};

use crate::mime_detect::{detect_mime_type, is_inline_safe, sniff_image_type};

/// State shared by media server routes.
#[derive(Clone)]
pub struct MediaServerState {
    pub media_dir: Arc<PathBuf>,
}

/// Build the media server Axum router.
///
/// Mount at `/images`:
///   GET /images/:filename  — serve a stored image
pub fn media_router(media_dir: PathBuf) -> Router {
    let state = MediaServerState {
        media_dir: Arc::new(media_dir),
    };
    Router::new()
        .route("/:filename", get(serve_media))
        .with_state(state)
}

/// GET /:filename — read a stored image from disk.
async fn serve_media(
    Path(filename): Path<String>,
    State(state): State<MediaServerState>,
) -> Response {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        warn!(filename = %filename, "Rejected suspicious media path");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.media_dir.join(&filename);
    debug!(path = %path.display(), "Serving media file");

    match fs::read(&path).await {
        Ok(bytes) => {
            let mut mime = sniff_image_type(&bytes);
            if mime == "application/octet-stream" {
                mime = detect_mime_type(&path);
            }
            let disposition = if is_inline_safe(mime) {
                format!("inline; filename=\"{filename}\"")
            } else {
                format!("attachment; filename=\"{filename}\"")
            };

            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            // Stored images are never rewritten.
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400, immutable"),
            );

            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Image not found").into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read media file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read image").into_response()
        }
    }
}
