// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod activities;
pub mod api;
pub mod auth;
pub mod cli;
pub mod gemini;
pub mod ratelimit;
pub mod secrets;
pub mod version;

// Re-export the pipeline types most callers need
pub use activities::{
    Activity, ActivityService, AgeRange, DateRange, ExtractError, GroundedActivityPrompts,
    PipelineError, PromptStrategy, RequestContext, SearchQuery, SearchRejection,
};

// Re-export types from supporting modules
pub use api::{create_app, AppState, SearchResponsePayload};
pub use auth::{
    AccessConfig, AccessDecision, AccessError, AccessGate, AppCheckVerifier, AttestationError,
    AttestationVerifier, DisabledVerifier, APP_CHECK_HEADER,
};
pub use gemini::{GeminiClient, GeminiConfig, GeminiError, GenerateRequest, TextGenerator};
pub use ratelimit::{RateLimitConfig, RateLimiter, SweeperHandle};
pub use secrets::{EnvSecrets, GoogleSecretManager, SecretError, SecretProvider};
