// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Mapping from pre-flight rejections to HTTP responses
//!
//! Every rejection renders as the standard error envelope, and internal
//! distinctions collapse outward: the body sees one 401 message whether
//! a token was missing, rejected, or unverifiable.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::search::SearchResponsePayload;
use crate::activities::SearchRejection;

/// HTTP status a rejection maps to
pub fn rejection_status(rejection: &SearchRejection) -> StatusCode {
    match rejection {
        SearchRejection::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        SearchRejection::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        SearchRejection::InvalidJson
        | SearchRejection::BlankQuery
        | SearchRejection::InvalidQuery(_) => StatusCode::BAD_REQUEST,
    }
}

/// Renders a rejection as its status code and error envelope
pub struct RejectionResponse(pub SearchRejection);

impl IntoResponse for RejectionResponse {
    fn into_response(self) -> Response {
        let status = rejection_status(&self.0);
        (
            status,
            Json(SearchResponsePayload::failure(self.0.to_string())),
        )
            .into_response()
    }
}
