// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request, result, and error types for activity search

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::AccessError;
use crate::gemini::GeminiError;

use super::extract::ExtractError;

/// Inbound search request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free-text activity query. Defaults to empty so an absent field is
    /// rejected as blank rather than as malformed JSON.
    #[serde(default)]
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: None,
            age_range: None,
            date_range: None,
        }
    }

    /// Whether the query text is missing or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Validate the optional filters. The blank-query case is checked
    /// separately because it carries its own outward message.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(age) = &self.age_range {
            if age.min > age.max {
                return Err("ageRange.min must not exceed ageRange.max".to_string());
            }
        }
        if let Some(dates) = &self.date_range {
            let start = NaiveDate::parse_from_str(&dates.start_date, "%Y-%m-%d")
                .map_err(|_| "dateRange.startDate must use yyyy-MM-dd format".to_string())?;
            let end = NaiveDate::parse_from_str(&dates.end_date, "%Y-%m-%d")
                .map_err(|_| "dateRange.endDate must use yyyy-MM-dd format".to_string())?;
            if start > end {
                return Err("dateRange.startDate must not be after dateRange.endDate".to_string());
            }
        }
        Ok(())
    }
}

/// Age filter, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

/// Date filter in ISO 8601 (yyyy-MM-dd)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// One normalized activity record.
///
/// Every field is a string; absent values are empty strings on input and
/// omitted on output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub age_range: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub price: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub booking_url: String,
}

/// Per-request identity: who is calling and under which trace id
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Client key used for rate limiting and allowlisting (normally an IP)
    pub client_key: String,
    /// Raw attestation token from the request header, if any
    pub attestation_token: Option<String>,
    /// Correlation id for logs
    pub request_id: String,
}

impl RequestContext {
    pub fn new(client_key: impl Into<String>, attestation_token: Option<String>) -> Self {
        Self {
            client_key: client_key.into(),
            attestation_token,
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Pre-flight rejections. These are the only failures callers ever see;
/// the Display strings are the outward error messages.
#[derive(Debug, Error)]
pub enum SearchRejection {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Invalid or missing App Check token")]
    Unauthorized(#[source] AccessError),
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Query parameter is required and cannot be empty")]
    BlankQuery,
    #[error("{0}")]
    InvalidQuery(String),
}

/// Post-admission pipeline failures. Logged, never surfaced to callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GeminiError),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}
