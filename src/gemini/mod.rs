// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gemini generateContent transport
//!
//! Thin client over the Gemini REST API. It knows how to send one
//! generation request and pull the text segments back out; prompt content
//! and multi-stage flows live in the activities layer.

pub mod client;
pub mod config;
pub mod types;

pub use client::{GeminiClient, TextGenerator};
pub use config::GeminiConfig;
pub use types::{
    Candidate, Content, GenerateRequest, GenerateResponse, GeminiError, Part, SystemInstruction,
    Tool,
};
