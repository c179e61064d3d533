// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Cloud Secret Manager client
//!
//! Authenticates with the instance metadata service, then reads the latest
//! version of a secret over the Secret Manager REST API. Payloads arrive
//! base64-encoded.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SecretError, SecretProvider};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const SECRET_MANAGER_BASE: &str = "https://secretmanager.googleapis.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Secret Manager client scoped to one GCP project
pub struct GoogleSecretManager {
    project_id: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

impl GoogleSecretManager {
    pub fn new(project_id: impl Into<String>) -> Result<Self, SecretError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            project_id: project_id.into(),
            client,
        })
    }

    /// Fetch a service-account access token from the metadata server
    async fn access_token(&self) -> Result<String, SecretError> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretError::Token(format!("metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(SecretError::Token(format!(
                "metadata server returned status {}",
                response.status().as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SecretError::Token(format!("invalid token response: {}", e)))?;
        Ok(token.access_token)
    }

    fn secret_url(&self, secret_name: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            SECRET_MANAGER_BASE, self.project_id, secret_name
        )
    }
}

#[async_trait]
impl SecretProvider for GoogleSecretManager {
    async fn get(&self, secret_name: &str) -> Result<String, SecretError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.secret_url(secret_name))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: AccessSecretResponse = response.json().await?;
        let bytes = BASE64
            .decode(envelope.payload.data.as_bytes())
            .map_err(|e| SecretError::Payload(e.to_string()))?;
        let value =
            String::from_utf8(bytes).map_err(|e| SecretError::Payload(e.to_string()))?;
        debug!(secret = secret_name, "secret fetched from Secret Manager");
        Ok(value)
    }
}
