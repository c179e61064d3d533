// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire types and errors for the generateContent API

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One generateContent request body
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateRequest {
    /// Request with search grounding enabled
    pub fn grounded(system_instruction: &str, prompt: &str) -> Self {
        let mut request = Self::plain(system_instruction, prompt);
        request.tools = Some(vec![Tool {
            google_search: Some(GoogleSearchTool {}),
        }]);
        request
    }

    /// Request answered from the model alone
    pub fn plain(system_instruction: &str, prompt: &str) -> Self {
        Self {
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            }),
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            tools: None,
        }
    }

    /// Whether this request has search grounding enabled
    pub fn is_grounded(&self) -> bool {
        self.tools.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearchTool>,
}

/// Marker enabling the built-in search tool; serializes as `{}`
#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearchTool {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Top-level generateContent response envelope
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: CandidateContent,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

/// Errors from the generative transport
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Client could not be built or credentials are unusable
    #[error("generative client configuration error: {0}")]
    Configuration(String),
    /// Connection, TLS, or timeout failure
    #[error("request to generative endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status
    #[error("generative endpoint returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    /// Body did not decode as a generateContent envelope
    #[error("generative endpoint returned an undecodable envelope: {0}")]
    MalformedEnvelope(String),
    /// Envelope decoded but held no candidates
    #[error("generative response contained no candidates")]
    NoCandidates,
    /// First candidate held no content parts
    #[error("generative response candidate contained no parts")]
    NoParts,
    /// All text in the response was empty or whitespace
    #[error("generative response text was empty")]
    EmptyText,
}
