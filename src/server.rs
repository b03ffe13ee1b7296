use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};

use crate::SummaryStyle;
use crate::error::AppError;
use crate::service::SummaryService;

const SERVICE_NAME: &str = "SummTube AI Service";

#[derive(Debug, Deserialize)]
pub struct SourceRequest {
    pub source: String,
    #[serde(alias = "sourceType")]
    pub source_type: String,
    #[serde(default, alias = "summaryType")]
    pub summary_type: Option<SummaryStyle>,
}

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    #[serde(alias = "videoUrl")]
    pub video_url: String,
    #[serde(default, alias = "summaryType")]
    pub summary_type: Option<SummaryStyle>,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub video_id: String,
    pub title: String,
    pub duration: u64,
    pub thumbnail: String,
    pub summary: String,
    pub transcript_length: usize,
    pub processing_time: f64,
    pub summary_type: SummaryStyle,
}

/// Build the HTTP router around a summary service
pub fn router(service: SummaryService, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        .route("/api/summarize", post(summarize_source))
        .route("/api/v1/summarize", post(summarize_video))
        .with_state(Arc::new(service))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Credentials cannot be combined with a wildcard origin
    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/v1/health",
            "summarize": "/api/v1/summarize"
        }
    }))
}

async fn health(State(service): State<Arc<SummaryService>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "api_key_loaded": service.llm_configured()
    }))
}

async fn summarize_source(
    State(service): State<Arc<SummaryService>>,
    payload: Result<Json<SourceRequest>, JsonRejection>,
) -> Result<Json<SourceResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::invalid(e.body_text()))?;
    let summary = service
        .summarize_source(&req.source_type, &req.source, req.summary_type.unwrap_or_default())
        .await?;
    Ok(Json(SourceResponse { summary }))
}

async fn summarize_video(
    State(service): State<Arc<SummaryService>>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<Json<VideoResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::invalid(e.body_text()))?;
    let summary = service
        .summarize_video(&req.video_url, req.summary_type.unwrap_or_default())
        .await?;

    Ok(Json(VideoResponse {
        video_id: summary.metadata.video_id,
        title: summary.metadata.title,
        duration: summary.metadata.duration_seconds,
        thumbnail: summary.metadata.thumbnail_url,
        summary: summary.result.text,
        transcript_length: summary.transcript_length,
        processing_time: summary.result.processing_time_seconds,
        summary_type: summary.result.style,
    }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            AppError::InvalidInput(reason) => warn!("Rejected request: {reason}"),
            AppError::UpstreamUnavailable(failure) => warn!("Transcript unavailable: {failure}"),
            AppError::ProviderRateLimited(detail) => error!("AI rate limit reached: {detail}"),
            AppError::ProviderError(detail) => error!("AI generation error: {detail}"),
            AppError::Unexpected(report) => error!("Unexpected error: {report:?}"),
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
        .into_response()
}
