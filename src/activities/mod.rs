// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activity search pipeline
//!
//! Turns a free-text activity query into normalized [`Activity`] records
//! via two generation stages: a search-grounded pass that gathers labeled
//! results with real URLs, then a reformatting pass that converts that
//! text into a JSON array.

pub mod extract;
pub mod prompt;
pub mod service;
pub mod types;

pub use extract::ExtractError;
pub use prompt::{GroundedActivityPrompts, PromptStrategy};
pub use service::ActivityService;
pub use types::{
    Activity, AgeRange, DateRange, PipelineError, RequestContext, SearchQuery, SearchRejection,
};
