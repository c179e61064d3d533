// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt construction for the two generation stages
//!
//! Stage 1 asks a search-grounded model for labeled activity records with
//! real landing-page URLs. Stage 2 asks a plain model call to reformat
//! that text into a JSON array without inventing anything. The wording is
//! load-bearing: weaker URL instructions make the model answer
//! "not available" instead of reading the search result metadata.

use chrono::{Datelike, Utc};

use super::types::SearchQuery;

/// Builds both prompts and their system instructions. Swappable so prompt
/// revisions can ship behind one seam.
pub trait PromptStrategy: Send + Sync {
    /// Identifier for logs, bumped when wording changes
    fn version(&self) -> &'static str;
    fn search_system_instruction(&self) -> &str;
    fn conversion_system_instruction(&self) -> &str;
    /// Stage-1 prompt built from the caller's query and filters
    fn search_prompt(&self, query: &SearchQuery) -> String;
    /// Stage-2 prompt wrapping the assembled stage-1 output
    fn conversion_prompt(&self, search_results: &str) -> String;
}

const SEARCH_SYSTEM_INSTRUCTION: &str = "You are a technical data extraction agent. Your primary goal is to find specific events and their official source URLs. When using Google Search, you must extract the landing page URL from the search result metadata. Never state that a URL is 'not available' if a relevant search result is present.";

const CONVERSION_SYSTEM_INSTRUCTION: &str = "You are a data reformatting assistant. Parse the provided Search Results text and convert it exactly into a JSON array. Do not generate new information, perform searches, or modify any details. Preserve all URLs and text verbatim from the provided data.";

const URL_INSTRUCTIONS: &str = r#"### CRITICAL INSTRUCTIONS FOR URLS:
1. For every activity identified, you MUST provide the direct 'official' URL (e.g., the website of the park, zoo, or organizer).
2. Look specifically at the 'source' link or 'metadata' attached to each search result snippet to find these URLs.
3. DO NOT state that the URL is 'not available' if a search result exists.
4. Format each entry as:
   - Name: [Activity Name]
   - Description: [1-2 sentences]
   - URL: [Direct Web Link]
   - Category: [Category type if available]
   - Location: [Specific venue/location name if available]
   - Price: [Price if available]"#;

const CONVERSION_HEADER: &str = "Convert the following activity search results into a JSON array. DO NOT perform any new searches, generate new activities, or modify any information. Only parse and reformat the exact data provided in the Search Results section below into the specified JSON structure. Preserve all URLs exactly as they appear in the search results.";

const CONVERSION_FORMAT: &str = r#"Please respond with ONLY a JSON array of activities in the following format (no additional text, no markdown):
[
  {
    "id": "unique-id",
    "title": "Activity Title",
    "description": "Brief description of the activity",
    "category": "Category (e.g., Educational, Sports, Arts, Outdoor)",
    "location": "Location name",
    "ageRange": "Age range (e.g., 6-12 years)",
    "date": "Date in yyyy-MM-dd format or empty string if not available",
    "price": "Price (e.g., Free, $20, $10-$30) or empty string if not available",
    "imageUrl": "https://example.com/image.jpg or empty string if not available",
    "bookingUrl": "[Extracted URL from search results] - MUST be the exact URL from the Search Results above"
  }
]

CRITICAL REQUIREMENTS:
- Generate a unique ID for each activity (e.g., "activity-1", "activity-2")
- Use the EXACT URLs from the search results for bookingUrl - copy them verbatim without changes
- Category: Extract from the search results only (Educational, Sports, Arts, Outdoor, Entertainment, Technology, Science, etc.)
- Location: Extract the specific venue/location name from the search results only
- Price: Extract price information from the search results only (e.g., "Free", "$25", "$15-$30", "From $20")
- If date is not available in search results, use an empty string ""
- If price is not mentioned in search results, use an empty string ""
- If imageUrl is not available, use an empty string ""
- Ensure all JSON is valid and properly formatted
- DO NOT add, remove, or invent any information not present in the Search Results"#;

/// Production prompt pair
pub struct GroundedActivityPrompts;

impl GroundedActivityPrompts {
    /// Year token for the stage-1 prompt: the year of the requested start
    /// date when one is present and well-formed, the current year otherwise.
    fn target_year(query: &SearchQuery) -> String {
        if let Some(dates) = &query.date_range {
            let prefix: String = dates.start_date.chars().take(4).collect();
            if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
                return prefix;
            }
        }
        Utc::now().year().to_string()
    }
}

impl PromptStrategy for GroundedActivityPrompts {
    fn version(&self) -> &'static str {
        "v1"
    }

    fn search_system_instruction(&self) -> &str {
        SEARCH_SYSTEM_INSTRUCTION
    }

    fn conversion_system_instruction(&self) -> &str {
        CONVERSION_SYSTEM_INSTRUCTION
    }

    fn search_prompt(&self, query: &SearchQuery) -> String {
        let mut prompt = format!("Search for 5-10 {} activities", query.query);

        if let Some(age) = &query.age_range {
            prompt.push_str(&format!(" for kids aged {}-{}", age.min, age.max));
        }

        if let Some(location) = &query.location {
            if !location.is_empty() {
                prompt.push_str(&format!(" in {}", location));
            }
        }

        prompt.push_str(&format!(
            " for school holidays in {}.\n\n",
            Self::target_year(query)
        ));
        prompt.push_str(URL_INSTRUCTIONS);
        prompt
    }

    fn conversion_prompt(&self, search_results: &str) -> String {
        format!(
            "{}\n\nSearch Results:\n{}\n\n{}",
            CONVERSION_HEADER, search_results, CONVERSION_FORMAT
        )
    }
}
