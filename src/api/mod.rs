// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP surface of the activity search service
//!
//! The API layer owns transport concerns only: routing, CORS, client
//! identity, and rendering rejections as the outward envelope. All
//! admission and pipeline decisions live in the activities layer.

pub mod errors;
pub mod http_server;
pub mod search;

pub use errors::{rejection_status, RejectionResponse};
pub use http_server::{client_key, create_app, serve, AppState, HealthResponse};
pub use search::{search_activities_handler, SearchResponsePayload};
