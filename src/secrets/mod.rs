// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credential retrieval for upstream API access
//!
//! The generative client never reads credentials itself; it asks a
//! [`SecretProvider`]. Production uses Google Secret Manager, local
//! development and tests use plain environment variables.

use async_trait::async_trait;
use thiserror::Error;

pub mod google;

pub use google::GoogleSecretManager;

/// Errors surfaced while fetching a secret
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to obtain an access token: {0}")]
    Token(String),
    #[error("secret request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("secret request returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("secret payload could not be decoded: {0}")]
    Payload(String),
    #[error("secret {0} is not available")]
    NotFound(String),
}

/// Source of named secrets
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch the current value of the named secret
    async fn get(&self, secret_name: &str) -> Result<String, SecretError>;
}

/// Environment-variable-backed secrets for local development and tests.
///
/// Secret names are mapped to variable names by uppercasing and replacing
/// dashes with underscores (`gemini-api-key` reads `GEMINI_API_KEY`).
pub struct EnvSecrets;

#[async_trait]
impl SecretProvider for EnvSecrets {
    async fn get(&self, secret_name: &str) -> Result<String, SecretError> {
        let var_name = secret_name.to_uppercase().replace('-', "_");
        std::env::var(&var_name).map_err(|_| SecretError::NotFound(secret_name.to_string()))
    }
}
