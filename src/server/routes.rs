//! HTTP routes consumed by the browser extension.
//!
//! Handlers are thin: parse the body, ask the [`DecisionEngine`], shape the
//! JSON. The engine never fails, so the only error responses are 400s for
//! unusable request bodies.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::telemetry;
use crate::{AudioSample, DecisionEngine, VolumeDirective};

/// Service identity reported by `/health`.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "crest-agent".to_string(),
            version: crate::PKG_VERSION.to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<DecisionEngine>,
    info: Arc<ServiceInfo>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(engine: Arc<DecisionEngine>, info: ServiceInfo) -> Self {
        Self {
            engine,
            info: Arc::new(info),
            metrics: None,
        }
    }

    /// Serve `/metrics` from this prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Build the application router. CORS is open to any origin, since the
/// caller is an extension content script on arbitrary pages.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/data", get(hello).post(subtitle_data))
        .route("/audio-data", post(audio_data))
        .route("/feedback", post(feedback))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct SubtitleRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct SubtitleResponse<'a> {
    #[serde(flatten)]
    directive: VolumeDirective,
    confidence: &'static str,
    subtitle_text: &'a str,
    processed: bool,
}

#[derive(Serialize)]
struct AudioResponse {
    #[serde(flatten)]
    directive: VolumeDirective,
    confidence: &'static str,
    confidence_score: Option<f32>,
    trigger: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume_data: Option<VolumeData>,
}

#[derive(Serialize)]
struct VolumeData {
    current: f64,
    baseline: f64,
    spike: f64,
}

fn record_request(endpoint: &'static str, method: &'static str, start: Instant) {
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "endpoint" => endpoint,
        "method" => method,
    )
    .increment(1);
    metrics::histogram!(telemetry::PROCESSING_DURATION_SECONDS, "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

fn bad_request(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn hello() -> Json<serde_json::Value> {
    let start = Instant::now();
    record_request("/data", "GET", start);
    Json(json!({ "message": "Hello" }))
}

async fn subtitle_data(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let request: SubtitleRequest = serde_json::from_slice(&body).unwrap_or_default();
    let text = request.text.unwrap_or_default();

    if text.is_empty() {
        warn!("empty subtitle text received");
        record_request("/data", "POST", start);
        return bad_request("No text provided");
    }

    let (verdict, directive) = state.engine.subtitle_directive(&text).await;
    info!(
        subtitle_length = text.len(),
        decision = verdict.decision.as_token(),
        outcome = verdict.outcome.as_str(),
        action = ?directive.action,
        processing_ms = start.elapsed().as_millis() as u64,
        "subtitle processed"
    );
    record_request("/data", "POST", start);

    Json(SubtitleResponse {
        directive,
        confidence: verdict.decision.as_token(),
        subtitle_text: &text,
        processed: true,
    })
    .into_response()
}

async fn audio_data(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let Some(sample) = parse_audio_sample(&body) else {
        warn!("empty or malformed audio data received");
        record_request("/audio-data", "POST", start);
        return bad_request("No data provided");
    };

    let (verdict, directive) = state.engine.audio_directive(sample).await;
    info!(
        volume = sample.volume,
        baseline = sample.baseline,
        spike = sample.spike,
        decision = verdict.decision.as_token(),
        outcome = verdict.outcome.as_str(),
        "audio tick processed"
    );
    record_request("/audio-data", "POST", start);

    let volume_data = directive.is_lowering().then_some(VolumeData {
        current: sample.volume,
        baseline: sample.baseline,
        spike: sample.spike,
    });

    Json(AudioResponse {
        directive,
        confidence: verdict.decision.as_token(),
        confidence_score: verdict.confidence,
        trigger: "audio_analysis",
        volume_data,
    })
    .into_response()
}

/// A JSON object with at least one field. Missing fields default to 0.
fn parse_audio_sample(body: &[u8]) -> Option<AudioSample> {
    let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body).ok()?;
    if fields.is_empty() {
        return None;
    }
    serde_json::from_value(serde_json::Value::Object(fields)).ok()
}

async fn feedback() -> Json<serde_json::Value> {
    let start = Instant::now();
    info!(
        event_type = "user_correction",
        feedback_source = "chrome_extension",
        "user correction received"
    );
    metrics::counter!(telemetry::USER_CORRECTIONS_TOTAL, "source" => "chrome_extension")
        .increment(1);
    record_request("/feedback", "POST", start);
    Json(json!({ "status": "ok" }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let start = Instant::now();
    record_request("/health", "GET", start);
    Json(json!({
        "status": "healthy",
        "service": state.info.service,
        "version": state.info.version,
        "environment": state.info.environment,
        "mode": state.engine.mode().as_str(),
    }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(ref handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
