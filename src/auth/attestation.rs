// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Firebase App Check token verification
//!
//! Tokens are RS256 JWTs signed by keys published at the App Check JWKS
//! endpoint. The key set is cached in memory and refreshed when a token
//! arrives with an unknown key id.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Request header carrying the attestation token
pub const APP_CHECK_HEADER: &str = "X-Firebase-AppCheck";

const APP_CHECK_JWKS_URL: &str = "https://firebaseappcheck.googleapis.com/v1/jwks";
const APP_CHECK_ISSUER_BASE: &str = "https://firebaseappcheck.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Why a token failed verification
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The token itself is bad: malformed, expired, wrong audience or
    /// issuer, or signed by an unknown key
    #[error("invalid attestation token: {0}")]
    Invalid(String),
    /// Verification infrastructure failed; says nothing about the token
    #[error("attestation service unavailable: {0}")]
    Service(String),
}

/// Verifies client attestation tokens
#[async_trait]
pub trait AttestationVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), AttestationError>;
}

/// Stand-in for deployments that run without attestation. Any
/// consultation is reported as a service failure.
pub struct DisabledVerifier;

#[async_trait]
impl AttestationVerifier for DisabledVerifier {
    async fn verify(&self, _token: &str) -> Result<(), AttestationError> {
        Err(AttestationError::Service(
            "attestation verifier not configured".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct AppCheckClaims {
    /// App resource name the token was minted for
    #[serde(default)]
    sub: String,
}

/// JWKS-backed App Check verifier scoped to one Firebase project
pub struct AppCheckVerifier {
    project_number: String,
    jwks_url: String,
    client: Client,
    keys: RwLock<Option<JwkSet>>,
}

impl AppCheckVerifier {
    pub fn new(project_number: impl Into<String>) -> Result<Self, AttestationError> {
        Self::with_jwks_url(project_number, APP_CHECK_JWKS_URL)
    }

    /// Point the verifier at a non-default JWKS endpoint (emulators)
    pub fn with_jwks_url(
        project_number: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Result<Self, AttestationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AttestationError::Service(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            project_number: project_number.into(),
            jwks_url: jwks_url.into(),
            client,
            keys: RwLock::new(None),
        })
    }

    fn expected_audience(&self) -> String {
        format!("projects/{}", self.project_number)
    }

    fn expected_issuer(&self) -> String {
        format!("{}/{}", APP_CHECK_ISSUER_BASE, self.project_number)
    }

    /// Return the cached key set, fetching it on first use
    async fn key_set(&self) -> Result<JwkSet, AttestationError> {
        if let Some(set) = self.keys.read().await.as_ref() {
            return Ok(set.clone());
        }
        self.refresh_keys().await
    }

    /// Fetch the key set from the JWKS endpoint and cache it
    async fn refresh_keys(&self) -> Result<JwkSet, AttestationError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AttestationError::Service(format!("JWKS fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AttestationError::Service(format!(
                "JWKS endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AttestationError::Service(format!("JWKS response undecodable: {}", e)))?;
        debug!(keys = set.keys.len(), "attestation key set refreshed");
        *self.keys.write().await = Some(set.clone());
        Ok(set)
    }
}

#[async_trait]
impl AttestationVerifier for AppCheckVerifier {
    async fn verify(&self, token: &str) -> Result<(), AttestationError> {
        let header = decode_header(token)
            .map_err(|e| AttestationError::Invalid(format!("malformed header: {}", e)))?;
        let kid = header
            .kid
            .ok_or_else(|| AttestationError::Invalid("token has no key id".to_string()))?;

        let mut set = self.key_set().await?;
        let jwk = match set.find(&kid) {
            Some(jwk) => jwk.clone(),
            // Keys rotate; retry once against a fresh set before rejecting
            None => {
                set = self.refresh_keys().await?;
                set.find(&kid)
                    .cloned()
                    .ok_or_else(|| AttestationError::Invalid(format!("unknown key id {}", kid)))?
            }
        };

        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| AttestationError::Service(format!("unusable verification key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.expected_audience()]);
        validation.set_issuer(&[self.expected_issuer()]);

        let data = decode::<AppCheckClaims>(token, &key, &validation)
            .map_err(|e| AttestationError::Invalid(e.to_string()))?;
        debug!(app = %data.claims.sub, "attestation token verified");
        Ok(())
    }
}
