// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Access gate: decides whether a request may proceed to the pipeline
//!
//! Order matters: allowlisted clients are admitted without their token
//! ever being inspected, then the global skip switch, then attestation.

use std::env;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::attestation::{AttestationError, AttestationVerifier};

/// Why a request was denied entry
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("attestation token missing")]
    Required,
    #[error("attestation token rejected: {0}")]
    Invalid(String),
    #[error("attestation service unavailable: {0}")]
    Service(String),
}

/// Outcome of the access decision
#[derive(Debug)]
pub enum AccessDecision {
    /// Admitted without attestation (allowlist or global skip)
    Bypass,
    /// Admitted with a verified attestation token
    Allowed,
    /// Denied
    Rejected(AccessError),
}

impl AccessDecision {
    pub fn permitted(&self) -> bool {
        matches!(self, AccessDecision::Bypass | AccessDecision::Allowed)
    }
}

/// Gate configuration, read from environment variables
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    /// Client keys admitted without attestation (ALLOWED_IPS, comma-separated)
    pub allowed_ips: Vec<String>,
    /// Disable attestation entirely (SKIP_APP_CHECK), development only
    pub skip_attestation: bool,
    /// Firebase project number tokens must be scoped to
    pub app_check_project_number: Option<String>,
}

impl AccessConfig {
    pub fn from_env() -> Self {
        let allowed_ips = env::var("ALLOWED_IPS")
            .map(|v| {
                v.split(',')
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let skip_attestation = env::var("SKIP_APP_CHECK")
            .map(|v| {
                let v = v.to_lowercase();
                v == "true" || v == "1"
            })
            .unwrap_or(false);
        Self {
            allowed_ips,
            skip_attestation,
            app_check_project_number: env::var("APP_CHECK_PROJECT_NUMBER").ok(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.skip_attestation && self.app_check_project_number.is_none() {
            return Err(
                "APP_CHECK_PROJECT_NUMBER must be set unless SKIP_APP_CHECK is enabled"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Decides admission for each request
pub struct AccessGate {
    allowed_ips: Vec<String>,
    skip_attestation: bool,
    verifier: Arc<dyn AttestationVerifier>,
}

impl AccessGate {
    pub fn new(config: AccessConfig, verifier: Arc<dyn AttestationVerifier>) -> Self {
        if config.skip_attestation {
            warn!("attestation checks are disabled (SKIP_APP_CHECK)");
        }
        if !config.allowed_ips.is_empty() {
            info!(
                count = config.allowed_ips.len(),
                "allowlist active, listed clients bypass attestation"
            );
        }
        Self {
            allowed_ips: config.allowed_ips,
            skip_attestation: config.skip_attestation,
            verifier,
        }
    }

    /// Decide whether the request identified by `client_key` may proceed
    pub async fn decide(&self, client_key: &str, token: Option<&str>) -> AccessDecision {
        if self.allowed_ips.iter().any(|ip| ip == client_key) {
            info!(client = %client_key, "allowlisted client, attestation bypassed");
            return AccessDecision::Bypass;
        }

        if self.skip_attestation {
            return AccessDecision::Bypass;
        }

        let token = match token {
            Some(t) if !t.trim().is_empty() => t,
            _ => return AccessDecision::Rejected(AccessError::Required),
        };

        match self.verifier.verify(token).await {
            Ok(()) => AccessDecision::Allowed,
            Err(AttestationError::Invalid(reason)) => {
                AccessDecision::Rejected(AccessError::Invalid(reason))
            }
            Err(AttestationError::Service(reason)) => {
                AccessDecision::Rejected(AccessError::Service(reason))
            }
        }
    }
}
