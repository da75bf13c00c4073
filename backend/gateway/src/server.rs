//! Main HTTP Gateway Server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use roachwatch_media::media_router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

use crate::control_ui;
use crate::detect;
use crate::detector::Detector;
use crate::health_api;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    /// `None` while required settings are missing; detection requests are refused.
    pub detector: Option<Arc<Detector>>,
    /// Names of the missing required settings.
    pub missing: Arc<[String]>,
}

impl GatewayState {
    pub fn configured(detector: Detector) -> Self {
        Self {
            detector: Some(Arc::new(detector)),
            missing: Arc::from(Vec::new()),
        }
    }

    pub fn unconfigured(missing: Vec<String>) -> Self {
        Self {
            detector: None,
            missing: Arc::from(missing),
        }
    }
}

pub struct GatewayOptions {
    /// Directory served under `/images` (local storage only).
    pub media_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

/// Assemble the full application router.
pub fn build_router(state: GatewayState, opts: GatewayOptions) -> Router {
    let mut app = Router::new()
        .route("/api/DetectCockroach", post(detect::detect_cockroach))
        .route("/api/detect", post(detect::detect_cockroach))
        .route("/api/health", get(health_api::get_health))
        .merge(control_ui::ui_router())
        .layer(DefaultBodyLimit::max(opts.max_upload_bytes))
        .with_state(state);

    if let Some(dir) = opts.media_dir {
        info!(dir = %dir.display(), "Serving stored images under /images");
        app = app.nest("/images", media_router(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `app` until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: &str, app: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use roachwatch_core::{InferenceClient, InferenceOutput, WatchError};
    use roachwatch_storage::{InMemoryBlobStore, InMemoryResultStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RESPONSE: &str = r#"{"id":"abc","iteration":"it1","predictions":[{"probability":0.76,"tagId":"t1","tagName":"cockroach","boundingBox":{"left":0.1,"top":0.2,"width":0.3,"height":0.4}}]}"#;

    /// Answers with `RESPONSE`, or fails with `fail_status` when set.
    #[derive(Default)]
    struct StubInference {
        fail_status: Option<u16>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceClient for StubInference {
        fn name(&self) -> &str {
            "stub"
        }

        async fn predict(&self, _image: Bytes) -> Result<InferenceOutput, WatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_status {
                Some(status) => Err(WatchError::Inference {
                    status,
                    body: "Not Found".into(),
                }),
                None => InferenceOutput::parse(Bytes::from_static(RESPONSE.as_bytes())),
            }
        }
    }

    struct Harness {
        base: String,
        blob: Arc<InMemoryBlobStore>,
        inference: Arc<StubInference>,
        results: Arc<InMemoryResultStore>,
    }

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn options() -> GatewayOptions {
        GatewayOptions {
            media_dir: None,
            max_upload_bytes: 1024,
        }
    }

    async fn configured(inference: StubInference) -> Harness {
        let blob = Arc::new(InMemoryBlobStore::new("mem://images"));
        let inference = Arc::new(inference);
        let results = Arc::new(InMemoryResultStore::new());
        let detector = Detector::new(blob.clone(), inference.clone(), results.clone());
        let base = spawn(build_router(GatewayState::configured(detector), options())).await;
        Harness {
            base,
            blob,
            inference,
            results,
        }
    }

    async fn post_image(base: &str, path: &str, body: &'static [u8]) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{base}{path}"))
            .header("content-type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn returns_inference_json_verbatim() {
        let h = configured(StubInference::default()).await;
        let resp = post_image(&h.base, "/api/DetectCockroach", b"\xFF\xD8\xFFjpeg").await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.text().await.unwrap(), RESPONSE);

        assert_eq!(h.blob.calls(), 1);
        assert_eq!(h.inference.calls.load(Ordering::SeqCst), 1);
        let events = h.results.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].partition_key, "Detection");
        assert!(events[0].image_url.starts_with("mem://images/"));
        assert!(events[0].image_url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn alias_route_runs_the_same_pipeline() {
        let h = configured(StubInference::default()).await;
        let resp = post_image(&h.base, "/api/detect", b"jpeg").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(h.results.calls(), 1);
    }

    #[tokio::test]
    async fn empty_body_is_bad_request_when_configured() {
        let h = configured(StubInference::default()).await;
        let resp = post_image(&h.base, "/api/DetectCockroach", b"").await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.text().await.unwrap(), "Please upload an image.");
        assert_eq!(h.blob.calls(), 0);
    }

    #[tokio::test]
    async fn empty_body_is_bad_request_when_unconfigured() {
        let state = GatewayState::unconfigured(vec!["CUSTOM_VISION_URL".into()]);
        let base = spawn(build_router(state, options())).await;
        let resp = post_image(&base, "/api/DetectCockroach", b"").await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.text().await.unwrap(), "Please upload an image.");
    }

    #[tokio::test]
    async fn missing_configuration_is_server_error() {
        let state = GatewayState::unconfigured(vec!["CUSTOM_VISION_KEY".into()]);
        let base = spawn(build_router(state, options())).await;
        let resp = post_image(&base, "/api/DetectCockroach", b"jpeg").await;
        assert_eq!(resp.status(), 500);
        assert_eq!(
            resp.text().await.unwrap(),
            "Server configuration error. Check App Configuration."
        );
    }

    #[tokio::test]
    async fn inference_failure_keeps_blob_and_skips_table() {
        let h = configured(StubInference {
            fail_status: Some(404),
            ..Default::default()
        })
        .await;
        let resp = post_image(&h.base, "/api/DetectCockroach", b"jpeg").await;

        assert_eq!(resp.status(), 500);
        assert_eq!(
            resp.text().await.unwrap(),
            "An error occurred: Custom Vision API failed with status 404"
        );
        assert_eq!(h.blob.calls(), 1);
        assert_eq!(h.blob.names().await.len(), 1);
        assert_eq!(h.results.calls(), 0);
    }

    #[tokio::test]
    async fn table_failure_is_server_error() {
        let h = configured(StubInference::default()).await;
        h.results.fail_appends();
        let resp = post_image(&h.base, "/api/DetectCockroach", b"jpeg").await;

        assert_eq!(resp.status(), 500);
        assert!(resp.text().await.unwrap().starts_with("An error occurred: table storage error"));
        assert_eq!(h.blob.calls(), 1);
        assert_eq!(h.inference.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let h = configured(StubInference::default()).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/DetectCockroach", h.base))
            .body(vec![0u8; 4096])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 413);
        assert_eq!(h.blob.calls(), 0);
    }

    #[tokio::test]
    async fn health_reports_missing_settings() {
        let state = GatewayState::unconfigured(vec!["STORAGE_CONNECTION_STRING".into()]);
        let base = spawn(build_router(state, options())).await;
        let health: serde_json::Value = reqwest::get(format!("{base}/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["service"], "roachwatch");
        assert_eq!(health["configured"], false);
        assert_eq!(health["missing"][0], "STORAGE_CONNECTION_STRING");
    }

    #[tokio::test]
    async fn health_is_ok_when_configured() {
        let h = configured(StubInference::default()).await;
        let health: serde_json::Value = reqwest::get(format!("{}/api/health", h.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["configured"], true);
        assert_eq!(health["missing"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn serves_browser_client() {
        let base = spawn(build_router(GatewayState::unconfigured(vec![]), options())).await;

        let index = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(index.status(), 200);
        assert!(index.text().await.unwrap().contains("app.js"));

        let script = reqwest::get(format!("{base}/app.js")).await.unwrap();
        assert!(script.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/javascript"));
        assert!(script.text().await.unwrap().contains("/api/DetectCockroach"));
    }

    #[tokio::test]
    async fn serves_local_images_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let app = build_router(
            GatewayState::unconfigured(vec![]),
            GatewayOptions {
                media_dir: Some(dir.path().to_path_buf()),
                max_upload_bytes: 1024,
            },
        );
        let base = spawn(app).await;

        let resp = reqwest::get(format!("{base}/images/a.jpg")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "image/jpeg");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let base = spawn(build_router(GatewayState::unconfigured(vec![]), options())).await;
        let resp = reqwest::Client::new()
            .get(format!("{base}/api/health"))
            .header("origin", "http://elsewhere.example")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }
}
