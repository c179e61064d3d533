// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activity search orchestration
//!
//! One service owns the whole request path: admission (rate limit, then
//! access gate, then body validation) and the two generation stages.
//! Admission failures are returned to the caller; anything that fails
//! after admission is logged and reported as an empty result set, so
//! upstream flakiness never turns into a client-visible error.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::extract::{self, ExtractError};
use super::prompt::PromptStrategy;
use super::types::{Activity, PipelineError, RequestContext, SearchQuery, SearchRejection};
use crate::auth::{AccessDecision, AccessGate};
use crate::gemini::{GeminiError, GenerateRequest, TextGenerator};
use crate::ratelimit::RateLimiter;

/// Coordinates admission checks and the two-stage generation pipeline
pub struct ActivityService {
    limiter: Arc<RateLimiter>,
    gate: AccessGate,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<dyn PromptStrategy>,
}

impl ActivityService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        gate: AccessGate,
        generator: Arc<dyn TextGenerator>,
        prompts: Arc<dyn PromptStrategy>,
    ) -> Self {
        Self {
            limiter,
            gate,
            generator,
            prompts,
        }
    }

    /// Handle one search request from the raw body bytes.
    ///
    /// Checks run in a fixed order: rate limit first (it applies to
    /// allowlisted clients too), then the access gate, then body parsing
    /// and validation. Only these pre-flight rejections surface as
    /// errors; a pipeline failure yields `Ok` with no activities.
    pub async fn handle_search(
        &self,
        ctx: &RequestContext,
        body: &[u8],
    ) -> Result<Vec<Activity>, SearchRejection> {
        if !self.limiter.allow(&ctx.client_key) {
            warn!(
                request_id = %ctx.request_id,
                client = %ctx.client_key,
                "rate limit exceeded"
            );
            return Err(SearchRejection::RateLimited);
        }

        match self
            .gate
            .decide(&ctx.client_key, ctx.attestation_token.as_deref())
            .await
        {
            AccessDecision::Bypass | AccessDecision::Allowed => {}
            AccessDecision::Rejected(reason) => {
                warn!(
                    request_id = %ctx.request_id,
                    client = %ctx.client_key,
                    reason = %reason,
                    "request denied by access gate"
                );
                return Err(SearchRejection::Unauthorized(reason));
            }
        }

        let query: SearchQuery = match serde_json::from_slice(body) {
            Ok(query) => query,
            Err(e) => {
                warn!(request_id = %ctx.request_id, error = %e, "request body is not valid JSON");
                return Err(SearchRejection::InvalidJson);
            }
        };
        if query.is_blank() {
            return Err(SearchRejection::BlankQuery);
        }
        if let Err(message) = query.validate() {
            warn!(request_id = %ctx.request_id, %message, "request filters rejected");
            return Err(SearchRejection::InvalidQuery(message));
        }

        info!(
            request_id = %ctx.request_id,
            query = %query.query,
            location = query.location.as_deref().unwrap_or(""),
            "processing activity search"
        );

        match self.run_pipeline(ctx, &query).await {
            Ok(activities) => Ok(activities),
            Err(error) => {
                self.note_pipeline_failure(ctx, &error);
                Ok(Vec::new())
            }
        }
    }

    /// Run the two generation stages for an already-admitted query.
    ///
    /// Stage 1 is search-grounded and produces labeled text with real
    /// URLs; stage 2 reformats that text into a JSON array. The stages
    /// are strictly sequential and neither is retried. Callers that want
    /// the real failure (the CLI, tests) use this directly.
    pub async fn run_pipeline(
        &self,
        ctx: &RequestContext,
        query: &SearchQuery,
    ) -> Result<Vec<Activity>, PipelineError> {
        let search_request = GenerateRequest::grounded(
            self.prompts.search_system_instruction(),
            &self.prompts.search_prompt(query),
        );
        let segments = self.generator.generate(search_request).await?;
        let search_text = extract::assemble_search_text(&segments);
        if search_text.trim().is_empty() {
            return Err(GeminiError::EmptyText.into());
        }
        debug!(
            request_id = %ctx.request_id,
            chars = search_text.len(),
            "search stage complete"
        );

        let conversion_request = GenerateRequest::plain(
            self.prompts.conversion_system_instruction(),
            &self.prompts.conversion_prompt(&search_text),
        );
        let segments = self.generator.generate(conversion_request).await?;
        let json_text = extract::assemble_text(&segments);
        if json_text.trim().is_empty() {
            return Err(GeminiError::EmptyText.into());
        }

        let mut activities = extract::extract_activities(&json_text)?;
        extract::finalize_ids(&mut activities);
        info!(
            request_id = %ctx.request_id,
            count = activities.len(),
            prompt_version = self.prompts.version(),
            "activity search pipeline complete"
        );
        Ok(activities)
    }

    /// Log a post-admission failure with its diagnostics. Raw model text
    /// stays in the logs; the caller only ever sees an empty result.
    fn note_pipeline_failure(&self, ctx: &RequestContext, error: &PipelineError) {
        match error {
            PipelineError::Extraction(ExtractError::StructuredParseFailure { raw }) => {
                error!(
                    request_id = %ctx.request_id,
                    raw_len = raw.len(),
                    "conversion output held no parsable activity array"
                );
                debug!(request_id = %ctx.request_id, raw = %raw, "unparsable conversion output");
            }
            PipelineError::Generation(error) => {
                error!(request_id = %ctx.request_id, error = %error, "generation stage failed");
            }
        }
    }
}
