#![cfg(feature = "server")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use crest::server::{AppState, ServiceInfo, router};
use crest::{Classifier, Crest, DecisionEngine, Result};

struct YesClassifier;

#[async_trait]
impl Classifier for YesClassifier {
    fn name(&self) -> &str {
        "yes"
    }

    async fn classify(&self, _prompt: &str) -> Result<String> {
        Ok("YES".to_string())
    }
}

fn app(engine: DecisionEngine) -> axum::Router {
    router(AppState::new(Arc::new(engine), ServiceInfo::default()))
}

fn mock_app() -> axum::Router {
    app(DecisionEngine::mock())
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_mode_and_identity() {
    let (status, body) = send(mock_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "crest-agent");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["mode"], "mock");
}

#[tokio::test]
async fn get_data_says_hello() {
    let (status, body) = send(mock_app(), get("/data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello");
}

#[tokio::test]
async fn empty_subtitle_is_bad_request() {
    let (status, body) = send(mock_app(), post_json("/data", r#"{"text":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No text provided");

    let (status, _) = send(mock_app(), post_json("/data", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(mock_app(), post_json("/data", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn loud_subtitle_lowers_volume() {
    let (status, body) = send(mock_app(), post_json("/data", r#"{"text":"[explosion]"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "LOWER_VOLUME");
    assert!((body["level"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert_eq!(body["duration"], 5000);
    assert_eq!(body["confidence"], "YES");
    assert_eq!(body["subtitle_text"], "[explosion]");
    assert_eq!(body["processed"], true);
}

#[tokio::test]
async fn quiet_subtitle_has_no_level() {
    let (status, body) = send(mock_app(), post_json("/data", r#"{"text":"Hello there"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "NONE");
    assert_eq!(body["confidence"], "NO");
    assert!(body.get("level").is_none());
    assert!(body.get("duration").is_none());
}

#[tokio::test]
async fn live_engine_serves_upstream_decision() {
    let engine = Crest::builder()
        .classifier(Arc::new(YesClassifier))
        .build()
        .unwrap();
    let (status, body) = send(app(engine), post_json("/data", r#"{"text":"Hello"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "LOWER_VOLUME");
}

#[tokio::test]
async fn loud_audio_includes_volume_data() {
    let (status, body) = send(
        mock_app(),
        post_json("/audio-data", r#"{"volume":0.9,"baseline":0.3,"spike":0.6}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "LOWER_VOLUME");
    assert!((body["level"].as_f64().unwrap() - 0.25).abs() < 1e-6);
    assert_eq!(body["duration"], 3000);
    assert_eq!(body["trigger"], "audio_analysis");
    assert_eq!(body["confidence"], "YES");
    assert!(body["confidence_score"].is_number());
    assert!((body["volume_data"]["spike"].as_f64().unwrap() - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn quiet_audio_omits_volume_data() {
    let (status, body) = send(
        mock_app(),
        post_json("/audio-data", r#"{"volume":0.2,"baseline":0.2,"spike":0.0}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "NONE");
    assert_eq!(body["confidence"], "NO");
    assert!(body.get("volume_data").is_none());
}

#[tokio::test]
async fn malformed_audio_is_bad_request() {
    let (status, body) = send(mock_app(), post_json("/audio-data", "garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");

    let (status, body) = send(mock_app(), post_json("/audio-data", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");

    let (status, _) = send(mock_app(), post_json("/audio-data", "[0.9, 0.3, 0.6]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_audio_fields_default_to_zero() {
    let (status, body) = send(mock_app(), post_json("/audio-data", r#"{"spike":0.5}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "LOWER_VOLUME");
    assert_eq!(body["volume_data"]["current"], 0.0);
}

#[tokio::test]
async fn feedback_acknowledges() {
    let (status, body) = send(mock_app(), post_json("/feedback", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_without_exporter_is_not_found() {
    let (status, _) = send(mock_app(), get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/data")
        .header("origin", "https://www.youtube.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = mock_app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
