#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tankrelay_api::config::ServerConfig;
use tankrelay_api::router::build_app_router;
use tankrelay_api::state::AppState;
use tankrelay_core::thresholds::LOW_LEVEL_THRESHOLD;
use tankrelay_core::topics::{TOPIC_ALERTS, TOPIC_RAW};
use tankrelay_events::transport::TransportKind;
use tankrelay_events::{AlertLog, MemoryTransport, TransportConfig};
use tempfile::TempDir;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults, logging alerts into `dir`.
pub fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:5173")],
        request_timeout_secs: 30,
        low_level_threshold: LOW_LEVEL_THRESHOLD,
        raw_topic: TOPIC_RAW.to_string(),
        alerts_topic: TOPIC_ALERTS.to_string(),
        alert_log_path: dir.path().join("alerts.log"),
        transport: TransportConfig {
            kind: TransportKind::Memory,
            url: String::new(),
            client_name: "tankrelay-api-test".to_string(),
            connect_timeout: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(1),
        },
    }
}

/// Everything a test needs to drive the app and observe its side effects.
pub struct TestApp {
    pub router: Router,
    pub transport: Arc<MemoryTransport>,
    pub config: ServerConfig,
    /// Keeps the alert log directory alive for the duration of the test.
    pub dir: TempDir,
}

/// Build the full application router, backed by an in-process transport.
pub fn build_test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(&dir);
    let transport = Arc::new(MemoryTransport::default());

    let state = AppState {
        config: Arc::new(config.clone()),
        transport: transport.clone(),
        alert_log: Arc::new(AlertLog::new(config.alert_log_path.clone())),
    };

    TestApp {
        router: build_app_router(state, &config),
        transport,
        config,
        dir,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
