// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search endpoint tests over the assembled router
//!
//! These tests verify that:
//! - Pre-flight rejections map to 429/401/400 with the failure envelope
//! - Non-POST methods on the search route answer 405
//! - CORS preflight is answered with permissive headers and no body
//! - Successful searches return the success envelope with activities
//! - Pipeline failures still read as a successful empty response
//! - The rate limiter keys on the first X-Forwarded-For entry
//! - The health endpoint reports status and version

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::util::ServiceExt; // for oneshot

use activity_search_service::{
    create_app, AccessConfig, AccessGate, ActivityService, AppState, AttestationError,
    AttestationVerifier, GeminiError, GenerateRequest, GroundedActivityPrompts, RateLimiter,
    SearchResponsePayload, TextGenerator,
};

const SEARCH_URI: &str = "/v1/activities/search";

const STAGE_TWO_JSON: &str = r#"[
    {
        "id": "activity-1",
        "title": "Pottery for Kids",
        "description": "Wheel-throwing taster class.",
        "category": "Arts",
        "bookingUrl": "https://example.com/pottery?session=holiday"
    },
    {
        "id": "activity-2",
        "title": "Junior Parkrun",
        "description": "Weekly 2km run for juniors.",
        "category": "Sports",
        "bookingUrl": "https://www.parkrun.com.au/juniors"
    },
    {
        "id": "activity-3",
        "title": "Library Code Club",
        "description": "Drop-in Scratch programming.",
        "category": "Technology",
        "bookingUrl": "https://library.example.gov/code-club"
    }
]"#;

/// Alternates a canned stage-1 and stage-2 answer per call.
struct CannedGenerator {
    calls: AtomicUsize,
}

impl CannedGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<Vec<String>, GeminiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            Ok(vec![
                "- Name: Pottery for Kids\n- URL: https://example.com/pottery?session=holiday"
                    .to_string(),
            ])
        } else {
            Ok(vec![STAGE_TWO_JSON.to_string()])
        }
    }
}

/// Fails every generation call with an upstream error.
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<Vec<String>, GeminiError> {
        Err(GeminiError::UpstreamStatus {
            status: 500,
            body: "internal".to_string(),
        })
    }
}

/// Rejects every token it is shown.
struct RejectingVerifier;

#[async_trait]
impl AttestationVerifier for RejectingVerifier {
    async fn verify(&self, _token: &str) -> Result<(), AttestationError> {
        Err(AttestationError::Invalid("signature mismatch".to_string()))
    }
}

fn app_with(limiter: RateLimiter, config: AccessConfig, generator: Arc<dyn TextGenerator>) -> Router {
    let service = ActivityService::new(
        Arc::new(limiter),
        AccessGate::new(config, Arc::new(RejectingVerifier)),
        generator,
        Arc::new(GroundedActivityPrompts),
    );
    create_app(AppState::new(Arc::new(service)))
}

/// Router with attestation skipped and a generous rate budget.
fn open_app(generator: Arc<dyn TextGenerator>) -> Router {
    let config = AccessConfig {
        skip_attestation: true,
        ..AccessConfig::default()
    };
    app_with(
        RateLimiter::with_window(100, Duration::from_secs(60)),
        config,
        generator,
    )
}

fn post_search(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(SEARCH_URI)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_payload(response: Response) -> SearchResponsePayload {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_successful_search_returns_activity_envelope() {
    let app = open_app(CannedGenerator::new());

    let response = app
        .oneshot(post_search(r#"{"query": "holiday activities"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_payload(response).await;
    assert!(payload.success);
    assert_eq!(payload.message.as_deref(), Some("Found 3 activities"));
    assert!(payload.error.is_none());

    let activities = payload.activities.unwrap();
    assert_eq!(activities.len(), 3);
    assert_eq!(
        activities[0].booking_url,
        "https://example.com/pottery?session=holiday"
    );
}

#[tokio::test]
async fn test_pipeline_failure_reads_as_empty_success() {
    let app = open_app(Arc::new(FailingGenerator));

    let response = app
        .oneshot(post_search(r#"{"query": "holiday activities"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_payload(response).await;
    assert!(payload.success);
    assert_eq!(payload.message.as_deref(), Some("Found 0 activities"));
    assert_eq!(payload.activities, Some(Vec::new()));
}

#[tokio::test]
async fn test_blank_query_returns_400() {
    let app = open_app(CannedGenerator::new());

    let response = app.oneshot(post_search(r#"{"query": "  "}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_payload(response).await;
    assert!(!payload.success);
    assert_eq!(
        payload.error.as_deref(),
        Some("Query parameter is required and cannot be empty")
    );
    assert!(payload.activities.is_none());
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let app = open_app(CannedGenerator::new());

    let response = app.oneshot(post_search("{broken")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_payload(response).await;
    assert_eq!(payload.error.as_deref(), Some("Invalid JSON format"));
}

#[tokio::test]
async fn test_invalid_date_range_returns_400() {
    let app = open_app(CannedGenerator::new());

    let body = r#"{
        "query": "sports",
        "dateRange": {"startDate": "2026-02-01", "endDate": "2026-01-01"}
    }"#;
    let response = app.oneshot(post_search(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_payload(response).await;
    assert_eq!(
        payload.error.as_deref(),
        Some("dateRange.startDate must not be after dateRange.endDate")
    );
}

#[tokio::test]
async fn test_missing_app_check_token_returns_401() {
    let app = app_with(
        RateLimiter::with_window(100, Duration::from_secs(60)),
        AccessConfig::default(),
        CannedGenerator::new(),
    );

    let response = app
        .oneshot(post_search(r#"{"query": "holiday activities"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_payload(response).await;
    assert!(!payload.success);
    assert_eq!(
        payload.error.as_deref(),
        Some("Invalid or missing App Check token")
    );
}

#[tokio::test]
async fn test_rejected_app_check_token_returns_401() {
    let app = app_with(
        RateLimiter::with_window(100, Duration::from_secs(60)),
        AccessConfig::default(),
        CannedGenerator::new(),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri(SEARCH_URI)
        .header("content-type", "application/json")
        .header("X-Firebase-AppCheck", "not-a-real-token")
        .body(Body::from(r#"{"query": "holiday activities"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_returns_429_per_forwarded_client() {
    let config = AccessConfig {
        skip_attestation: true,
        ..AccessConfig::default()
    };
    let app = app_with(
        RateLimiter::with_window(1, Duration::from_secs(60)),
        config,
        CannedGenerator::new(),
    );

    let request_from = |forwarded: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(SEARCH_URI)
            .header("content-type", "application/json")
            .header("X-Forwarded-For", forwarded)
            .body(Body::from(r#"{"query": "holiday activities"}"#))
            .unwrap()
    };

    // First request from the client spends its whole budget.
    let response = app
        .clone()
        .oneshot(request_from("203.0.113.5, 70.41.3.18"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same first entry, different proxy chain: same client, so rejected.
    let response = app.clone().oneshot(request_from("203.0.113.5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let payload = read_payload(response).await;
    assert_eq!(
        payload.error.as_deref(),
        Some("Rate limit exceeded. Please try again later.")
    );

    // A different client keys a separate window.
    let response = app.oneshot(request_from("198.51.100.8")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_on_search_route_returns_405() {
    let app = open_app(CannedGenerator::new());

    let request = Request::builder()
        .method(Method::GET)
        .uri(SEARCH_URI)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let payload = read_payload(response).await;
    assert!(!payload.success);
    assert_eq!(payload.error.as_deref(), Some("Method not allowed. Use POST."));
}

#[tokio::test]
async fn test_cors_preflight_is_answered_without_a_body() {
    let app = open_app(CannedGenerator::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(SEARCH_URI)
        .header("Origin", "https://app.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "x-firebase-appcheck")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .expect("preflight must carry an allow-origin header");
    assert_eq!(allow_origin, "*");
    let allow_methods = response
        .headers()
        .get("access-control-allow-methods")
        .expect("preflight must carry an allow-methods header")
        .to_str()
        .unwrap();
    assert!(allow_methods.contains("POST"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty(), "preflight responses carry no body");
}

#[tokio::test]
async fn test_health_reports_status_and_version() {
    let app = open_app(CannedGenerator::new());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(
        health["version"],
        activity_search_service::version::VERSION_NUMBER
    );
}
