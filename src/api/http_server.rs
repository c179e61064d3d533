use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, Method},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::search::{method_not_allowed_handler, search_activities_handler};
use crate::activities::ActivityService;
use crate::version;

/// How long browsers may cache the preflight answer
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ActivityService>,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<ActivityService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Build the router with all routes and layers applied.
///
/// OPTIONS requests are answered by the CORS layer itself, so the search
/// route only needs its POST handler and a fallback for other methods.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Activity search
        .route(
            "/v1/activities/search",
            post(search_activities_handler).fallback(method_not_allowed_handler),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-firebase-appcheck"),
                ])
                .max_age(CORS_MAX_AGE),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Client identity used for rate limiting and allowlisting: the first
/// X-Forwarded-For entry when the header is present, else the socket
/// peer address, else a loopback placeholder.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION_NUMBER.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Bind and serve until a shutdown signal arrives
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("activity search service listening on {}", addr);

    let app = create_app(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
