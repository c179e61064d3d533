// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activity search API endpoint
//!
//! Provides the `/v1/activities/search` HTTP endpoint.

pub mod handler;
pub mod response;

pub use handler::{method_not_allowed_handler, search_activities_handler};
pub use response::SearchResponsePayload;
