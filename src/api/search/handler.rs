// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activity search endpoint handler

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

use super::response::SearchResponsePayload;
use crate::activities::RequestContext;
use crate::api::errors::RejectionResponse;
use crate::api::http_server::{client_key, AppState};
use crate::auth::APP_CHECK_HEADER;

/// POST /v1/activities/search - Find activities for a free-text query
///
/// # Request
/// - `query`: Free-text activity query (required, must not be blank)
/// - `location`: Optional place name
/// - `ageRange`: Optional `{min, max}` filter, min <= max
/// - `dateRange`: Optional `{startDate, endDate}` in yyyy-MM-dd
/// - `X-Firebase-AppCheck` header: attestation token unless the client
///   is allowlisted or attestation is disabled
///
/// # Response
/// - `success`: Always true on HTTP 200
/// - `activities`: Normalized activity array, possibly empty
/// - `message`: "Found N activities"
///
/// # Errors
/// - 400 Bad Request: Malformed JSON, blank query, or invalid filters
/// - 401 Unauthorized: Missing or rejected attestation token
/// - 429 Too Many Requests: Client exceeded its request window
pub async fn search_activities_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let token = headers
        .get(APP_CHECK_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let ctx = RequestContext::new(client_key(&headers, peer), token);

    info!(
        request_id = %ctx.request_id,
        client = %ctx.client_key,
        "POST /v1/activities/search"
    );
    debug!(request_id = %ctx.request_id, body_bytes = body.len(), "request body received");

    match state.service.handle_search(&ctx, &body).await {
        Ok(activities) => {
            (StatusCode::OK, Json(SearchResponsePayload::found(activities))).into_response()
        }
        Err(rejection) => RejectionResponse(rejection).into_response(),
    }
}

/// Envelope for requests using a method other than POST or OPTIONS
pub async fn method_not_allowed_handler() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(SearchResponsePayload::failure("Method not allowed. Use POST.")),
    )
        .into_response()
}
