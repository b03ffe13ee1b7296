mod mocks;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use mocks::summarizer::MockSummarizer;
use mocks::youtube::{MockCaptions, MockExtractor, MockFetcher, sample_info};
use serde_json::{Value, json};
use summtube::error::{RETRY_LATER_MESSAGE, SummarizationFailure};
use summtube::server::router;
use summtube::service::SummaryService;
use summtube::transcript::{RetryPolicy, TranscriptChain};
use tower::ServiceExt;

struct Harness {
    app: Router,
    captions: MockCaptions,
    extractor: MockExtractor,
    summarizer: MockSummarizer,
}

fn harness(captions: MockCaptions, extractor: MockExtractor, summarizer: MockSummarizer) -> Harness {
    let chain = TranscriptChain::new(
        Arc::new(captions.clone()),
        Arc::new(extractor.clone()),
        Arc::new(MockFetcher::default()),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
    );
    let service = SummaryService::new(chain, Arc::new(summarizer.clone()));
    let app = router(service, &["http://localhost:3000".to_string()]);
    Harness {
        app,
        captions,
        extractor,
        summarizer,
    }
}

fn default_harness() -> Harness {
    harness(
        MockCaptions::ok("transcript from captions"),
        MockExtractor::ok(sample_info()),
        MockSummarizer::new("provider summary"),
    )
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ─── Status endpoints ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_root_status() {
    let h = default_harness();
    let (status, body) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["endpoints"]["summarize"], "/api/v1/summarize");
}

#[tokio::test]
async fn test_health_reports_credential() {
    let h = default_harness();
    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["api_key_loaded"], true);
    }
}

// ─── Source endpoint ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_source_passes_through_to_prompt() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "hello world", "source_type": "text"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"summary": "provider summary"}));

    let calls = h.summarizer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("Transcript:\nhello world"));
    assert!(h.captions.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_url_source_is_a_stub_without_external_calls() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "not-a-url", "sourceType": "url"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["summary"].as_str().unwrap().contains("not-a-url"));
    assert!(h.summarizer.calls.lock().unwrap().is_empty());
    assert!(h.captions.calls.lock().unwrap().is_empty());
    assert!(h.extractor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_source_type_rejected() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "https://youtu.be/dQw4w9WgXcQ", "source_type": "invalid"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Unsupported source type");
    assert!(h.captions.calls.lock().unwrap().is_empty());
    assert!(h.extractor.calls.lock().unwrap().is_empty());
    assert!(h.summarizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_text_rejected() {
    let h = default_harness();
    let (status, _) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "  ", "source_type": "text"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.summarizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_youtube_source_uses_transcript() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "https://youtu.be/dQw4w9WgXcQ", "source_type": "youtube", "summary_type": "brief"})
            .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "provider summary");
    assert_eq!(*h.captions.calls.lock().unwrap(), vec!["dQw4w9WgXcQ".to_string()]);
    assert!(h.summarizer.calls.lock().unwrap()[0].contains("2-3 paragraph"));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let h = default_harness();
    let (status, body) = post(&h.app, "/api/summarize", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

// ─── Video endpoint ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_video_summary_response_shape() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/v1/summarize",
        &json!({"video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "summary_type": "bullet_points"})
            .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video_id"], "dQw4w9WgXcQ");
    assert_eq!(body["title"], "Sample Video");
    assert_eq!(body["duration"], 125);
    assert_eq!(body["summary"], "provider summary");
    assert_eq!(body["transcript_length"], "transcript from captions".len());
    assert_eq!(body["processing_time"], 0.42);
    assert_eq!(body["summary_type"], "bullet_points");

    let prompt = &h.summarizer.calls.lock().unwrap()[0];
    assert!(prompt.contains("titled \"Sample Video\""));
}

#[tokio::test]
async fn test_video_unknown_style_falls_back_to_detailed() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/v1/summarize",
        &json!({"videoUrl": "https://youtu.be/dQw4w9WgXcQ", "summaryType": "haiku"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary_type"], "detailed");
}

#[tokio::test]
async fn test_invalid_video_url_rejected() {
    let h = default_harness();
    let (status, body) = post(
        &h.app,
        "/api/v1/summarize",
        &json!({"video_url": "https://example.com/video"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid YouTube URL");
    assert!(h.captions.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_throttled_acquisition_advises_retry() {
    let h = harness(
        MockCaptions::failing("HTTP status client error (429 Too Many Requests)"),
        MockExtractor::failing("ERROR: HTTP Error 429: Too Many Requests"),
        MockSummarizer::new("unused"),
    );
    let (status, body) = post(
        &h.app,
        "/api/v1/summarize",
        &json!({"video_url": "https://youtu.be/dQw4w9WgXcQ"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], RETRY_LATER_MESSAGE);
    assert!(h.summarizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_rate_limit_is_429_on_both_endpoints() {
    let h = harness(
        MockCaptions::ok("text"),
        MockExtractor::ok(sample_info()),
        MockSummarizer::failing(SummarizationFailure::RateLimited("429 RESOURCE_EXHAUSTED".into())),
    );

    let (status, _) = post(
        &h.app,
        "/api/v1/summarize",
        &json!({"video_url": "https://youtu.be/dQw4w9WgXcQ"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "hello", "source_type": "text"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_provider_error_is_500() {
    let h = harness(
        MockCaptions::ok("text"),
        MockExtractor::ok(sample_info()),
        MockSummarizer::failing(SummarizationFailure::GenerationFailed("Gemini API returned 500".into())),
    );
    let (status, body) = post(
        &h.app,
        "/api/summarize",
        &json!({"source": "hello", "source_type": "text"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Failed to generate summary"));
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let h = default_harness();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/summarize")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
}
