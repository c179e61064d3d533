// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for the Gemini generateContent endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::config::GeminiConfig;
use super::types::{GenerateRequest, GenerateResponse, GeminiError};
use crate::secrets::SecretProvider;

/// Sends one generation request and returns the text segments of the
/// first candidate, in order. The pipeline is exercised against this
/// trait so tests can swap in canned generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<Vec<String>, GeminiError>;
}

/// Gemini REST client
#[derive(Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// Build a client, fetching the API key through the secret provider.
    /// Fails fast at startup rather than on the first request.
    pub async fn new(
        config: &GeminiConfig,
        secrets: &dyn SecretProvider,
    ) -> Result<Self, GeminiError> {
        let api_key = secrets.get(&config.secret_name).await.map_err(|e| {
            GeminiError::Configuration(format!(
                "failed to fetch credential {}: {}",
                config.secret_name, e
            ))
        })?;
        if api_key.trim().is_empty() {
            return Err(GeminiError::Configuration(format!(
                "credential {} is empty",
                config.secret_name
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                GeminiError::Configuration(format!("failed to build http client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Vec<String>, GeminiError> {
        debug!(
            model = %self.model,
            grounded = request.is_grounded(),
            "sending generation request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeminiError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::MalformedEnvelope(e.to_string()))?;
        first_candidate_segments(envelope)
    }
}

/// Pull the text segments out of the first candidate
fn first_candidate_segments(envelope: GenerateResponse) -> Result<Vec<String>, GeminiError> {
    let candidate = envelope
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::NoCandidates)?;
    if let Some(reason) = &candidate.finish_reason {
        if reason != "STOP" {
            debug!(finish_reason = %reason, "candidate finished abnormally");
        }
    }
    let segments: Vec<String> = candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect();
    if segments.is_empty() {
        return Err(GeminiError::NoParts);
    }
    Ok(segments)
}
