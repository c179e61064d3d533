// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activity search response envelope

use serde::{Deserialize, Serialize};

use crate::activities::Activity;

/// Response body for POST /v1/activities/search.
///
/// Success carries the activity list and a count message; failure
/// carries only the outward error string. Absent fields are omitted
/// rather than serialized as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponsePayload {
    /// Whether the request was accepted and processed
    pub success: bool,

    /// Normalized activities, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,

    /// Human-readable summary, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Outward error message, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponsePayload {
    /// Success envelope for a result set, empty or not
    pub fn found(activities: Vec<Activity>) -> Self {
        let message = format!("Found {} activities", activities.len());
        Self {
            success: true,
            activities: Some(activities),
            message: Some(message),
            error: None,
        }
    }

    /// Failure envelope carrying only the outward message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            activities: None,
            message: None,
            error: Some(error.into()),
        }
    }
}
