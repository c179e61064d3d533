// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recovering structured activities from loosely formatted model text
//!
//! The reformatting stage is told to answer with bare JSON, but models
//! wrap output in markdown fences or surround it with prose anyway. The
//! extractor tries progressively looser readings of the text and fails
//! only when none of them yields a valid activity array.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::types::Activity;

/// Phrase marking a stage-1 segment that announces the search instead of
/// reporting results
const SEARCH_ACK_PHRASE: &str = "Okay, I will search";

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Failure to recover a structured activity list
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No reading of the text produced a valid activity array. The raw
    /// text rides along for logging and is never shown to callers.
    #[error("no activity array could be recovered from {} bytes of response text", raw.len())]
    StructuredParseFailure { raw: String },
}

/// Assemble stage-1 text from response segments.
///
/// When the model emits a leading acknowledgement segment ("Okay, I will
/// search...") followed by the actual results, the acknowledgement is
/// dropped so it cannot leak into the conversion prompt. A lone segment
/// is always kept, even if it contains the phrase.
pub fn assemble_search_text(segments: &[String]) -> String {
    if segments.len() > 1 && segments[0].contains(SEARCH_ACK_PHRASE) {
        debug!("dropping acknowledgement segment from search output");
        return segments[1..].concat();
    }
    segments.concat()
}

/// Assemble stage-2 text: the segments concatenated in order
pub fn assemble_text(segments: &[String]) -> String {
    segments.concat()
}

/// Recover an activity array from model output.
///
/// Attempts, in order: the whole text as JSON, the interior of a
/// markdown `json` fence, the interior of a plain fence pair, and the
/// whole text once more when no complete fence exists. The first
/// reading that parses wins.
pub fn extract_activities(text: &str) -> Result<Vec<Activity>, ExtractError> {
    let whole = text.trim();
    if let Ok(activities) = serde_json::from_str::<Vec<Activity>>(whole) {
        return Ok(activities);
    }

    let mut fence_found = false;
    if let Some(interior) = fenced_interior(text, JSON_FENCE) {
        fence_found = true;
        if let Ok(activities) = serde_json::from_str::<Vec<Activity>>(interior.trim()) {
            debug!("activities recovered from a json fence");
            return Ok(activities);
        }
    }
    if let Some(interior) = fenced_interior(text, FENCE) {
        fence_found = true;
        if let Ok(activities) = serde_json::from_str::<Vec<Activity>>(interior.trim()) {
            debug!("activities recovered from a plain fence");
            return Ok(activities);
        }
    }
    if !fence_found {
        if let Ok(activities) = serde_json::from_str::<Vec<Activity>>(whole) {
            return Ok(activities);
        }
    }

    Err(ExtractError::StructuredParseFailure {
        raw: text.to_string(),
    })
}

/// Text between `marker` and the next closing fence, when both exist.
/// An unterminated fence yields nothing rather than the tail of the text.
fn fenced_interior<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let end = text[start..].find(FENCE)?;
    Some(&text[start..start + end])
}

/// Ensure every activity carries a non-blank id that is unique within the
/// list. Model-supplied ids are kept; blank and duplicate ids are
/// replaced with position-based `activity-N` values (1-based).
pub fn finalize_ids(activities: &mut [Activity]) {
    let mut seen: HashSet<String> = HashSet::new();
    for (index, activity) in activities.iter_mut().enumerate() {
        if activity.id.trim().is_empty() || seen.contains(&activity.id) {
            let mut n = index + 1;
            let mut fresh = format!("activity-{}", n);
            // The positional id can itself collide with one the model chose
            while seen.contains(&fresh) {
                n += 1;
                fresh = format!("activity-{}", n);
            }
            activity.id = fresh;
        }
        seen.insert(activity.id.clone());
    }
}
