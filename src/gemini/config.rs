// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the Gemini client

use std::env;

/// Model used when GEMINI_MODEL is not set
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// API origin used when GEMINI_API_BASE is not set
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Secret Manager entry holding the API key
pub const DEFAULT_SECRET_NAME: &str = "gemini-api-key";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// GCP project hosting the API key secret (GOOGLE_CLOUD_PROJECT)
    pub project_id: Option<String>,
    /// Model identifier
    pub model: String,
    /// API origin, overridable for emulators and tests
    pub api_base: String,
    /// Secret Manager entry name for the API key
    pub secret_name: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl GeminiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            project_id: env::var("GOOGLE_CLOUD_PROJECT").ok(),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_base: env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            secret_name: env::var("GEMINI_SECRET_NAME")
                .unwrap_or_else(|_| DEFAULT_SECRET_NAME.to_string()),
            request_timeout_secs: env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("GEMINI_MODEL must not be empty".to_string());
        }
        if !self.api_base.starts_with("http") {
            return Err("GEMINI_API_BASE must be an http(s) origin".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("GEMINI_TIMEOUT_SECS must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
