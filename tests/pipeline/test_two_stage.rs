// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-stage generation pipeline tests
//!
//! These tests verify that:
//! - Stage 1 runs with search grounding and stage 2 runs without it
//! - Stage-1 text is embedded verbatim in the conversion prompt
//! - Acknowledgement intro segments are dropped before conversion
//! - Failures after admission collapse to an empty successful result
//! - Fenced conversion output is recovered and ids come out unique
//! - `run_pipeline` still surfaces the underlying error for operator use

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use activity_search_service::{
    AccessConfig, AccessGate, ActivityService, AttestationError, AttestationVerifier, GeminiError,
    GenerateRequest, GroundedActivityPrompts, PipelineError, RateLimiter, RequestContext,
    SearchQuery, TextGenerator,
};

const STAGE_ONE_TEXT: &str = "- Name: Questacon Holiday Workshop\n\
     - Description: Hands-on science sessions for school-age kids.\n\
     - URL: https://www.questacon.edu.au/visiting/holiday-programs?ref=search\n\
     - Category: Science\n\
     - Location: Canberra\n\
     - Price: $25";

/// Replays a fixed script of stage responses and records every request.
struct ScriptedGenerator {
    script: Mutex<Vec<Result<Vec<String>, GeminiError>>>,
    seen: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    fn new(script: Vec<Result<Vec<String>, GeminiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<Vec<String>, GeminiError> {
        self.seen.lock().unwrap().push(request);
        let mut script = self.script.lock().unwrap();
        assert!(!script.is_empty(), "generator called more times than scripted");
        script.remove(0)
    }
}

/// Verifier that must never be consulted when attestation is skipped.
struct PanickyVerifier;

#[async_trait]
impl AttestationVerifier for PanickyVerifier {
    async fn verify(&self, _token: &str) -> Result<(), AttestationError> {
        panic!("attestation verifier consulted while skipped");
    }
}

fn service_with(generator: Arc<ScriptedGenerator>) -> ActivityService {
    let config = AccessConfig {
        skip_attestation: true,
        ..AccessConfig::default()
    };
    ActivityService::new(
        Arc::new(RateLimiter::with_window(100, Duration::from_secs(60))),
        AccessGate::new(config, Arc::new(PanickyVerifier)),
        generator,
        Arc::new(GroundedActivityPrompts),
    )
}

fn stage_two_json() -> String {
    r#"[
        {
            "id": "activity-1",
            "title": "Questacon Holiday Workshop",
            "description": "Hands-on science sessions for school-age kids.",
            "category": "Science",
            "location": "Canberra",
            "ageRange": "6-12 years",
            "date": "2026-01-12",
            "price": "$25",
            "imageUrl": "",
            "bookingUrl": "https://www.questacon.edu.au/visiting/holiday-programs?ref=search"
        },
        {
            "id": "activity-2",
            "title": "National Zoo Keeper Talk",
            "description": "Daily keeper talks at the wildlife park.",
            "category": "Outdoor",
            "location": "Canberra",
            "ageRange": "All ages",
            "date": "",
            "price": "Free",
            "imageUrl": "",
            "bookingUrl": "https://nationalzoo.com.au/keeper-talks"
        },
        {
            "id": "activity-3",
            "title": "Botanic Gardens Trail",
            "description": "Self-guided nature trail with activity sheets.",
            "category": "Outdoor",
            "location": "Canberra",
            "ageRange": "4-10 years",
            "date": "",
            "price": "Free",
            "imageUrl": "",
            "bookingUrl": "https://www.anbg.gov.au/gardens/visiting/trails/"
        }
    ]"#
    .to_string()
}

fn body() -> &'static [u8] {
    br#"{"query": "school holiday activities", "location": "Canberra"}"#
}

#[tokio::test]
async fn test_search_stage_then_conversion_stage_in_order() {
    let generator = ScriptedGenerator::new(vec![
        Ok(vec![STAGE_ONE_TEXT.to_string()]),
        Ok(vec![stage_two_json()]),
    ]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 2, "expected exactly two generation calls");
    assert!(requests[0].is_grounded(), "stage 1 must carry the search tool");
    assert!(!requests[1].is_grounded(), "stage 2 must not search");

    let search_instruction = &requests[0].system_instruction.as_ref().unwrap().parts[0].text;
    assert!(search_instruction.starts_with("You are a technical data extraction agent."));
    let conversion_instruction = &requests[1].system_instruction.as_ref().unwrap().parts[0].text;
    assert!(conversion_instruction.starts_with("You are a data reformatting assistant."));

    // Stage-1 output must flow into the conversion prompt unmodified.
    let conversion_prompt = &requests[1].contents[0].parts[0].text;
    assert!(conversion_prompt.contains(STAGE_ONE_TEXT));

    assert_eq!(activities.len(), 3);
    assert_eq!(
        activities[0].booking_url,
        "https://www.questacon.edu.au/visiting/holiday-programs?ref=search"
    );
    assert_eq!(
        activities[1].booking_url,
        "https://nationalzoo.com.au/keeper-talks"
    );
}

#[tokio::test]
async fn test_acknowledgement_intro_dropped_before_conversion() {
    let generator = ScriptedGenerator::new(vec![
        Ok(vec![
            "Okay, I will search for school holiday activities in Canberra.".to_string(),
            "- Name: Real Activity\n- URL: https://example.org/real".to_string(),
        ]),
        Ok(vec![stage_two_json()]),
    ]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    service.handle_search(&ctx, body()).await.unwrap();

    let requests = generator.requests();
    let conversion_prompt = &requests[1].contents[0].parts[0].text;
    assert!(conversion_prompt.contains("https://example.org/real"));
    assert!(
        !conversion_prompt.contains("Okay, I will search"),
        "acknowledgement segment leaked into the conversion prompt"
    );
}

#[tokio::test]
async fn test_upstream_failure_collapses_to_empty_success() {
    let generator = ScriptedGenerator::new(vec![Err(GeminiError::UpstreamStatus {
        status: 500,
        body: "quota exhausted".to_string(),
    })]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    assert!(activities.is_empty());
    assert_eq!(
        generator.requests().len(),
        1,
        "stage 2 must not run after a stage-1 failure"
    );
}

#[tokio::test]
async fn test_empty_search_text_stops_before_conversion() {
    let generator = ScriptedGenerator::new(vec![Ok(vec!["   ".to_string()])]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    assert!(activities.is_empty());
    assert_eq!(generator.requests().len(), 1);
}

#[tokio::test]
async fn test_unparseable_conversion_output_collapses_to_empty_success() {
    let generator = ScriptedGenerator::new(vec![
        Ok(vec![STAGE_ONE_TEXT.to_string()]),
        Ok(vec!["I could not find any structured data to convert.".to_string()]),
    ]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    assert!(activities.is_empty());
    assert_eq!(generator.requests().len(), 2, "both stages should have run");
}

#[tokio::test]
async fn test_fenced_conversion_output_is_recovered() {
    let fenced = format!("Here is the JSON you asked for:\n```json\n{}\n```", stage_two_json());
    let generator = ScriptedGenerator::new(vec![
        Ok(vec![STAGE_ONE_TEXT.to_string()]),
        Ok(vec![fenced]),
    ]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    assert_eq!(activities.len(), 3);
    assert_eq!(activities[2].title, "Botanic Gardens Trail");
}

#[tokio::test]
async fn test_ids_are_unique_after_normalization() {
    let duplicated = r#"[
        {"id": "", "title": "First", "description": "a", "category": "c"},
        {"id": "activity-1", "title": "Second", "description": "b", "category": "c"},
        {"id": "activity-1", "title": "Third", "description": "d", "category": "c"}
    ]"#;
    let generator = ScriptedGenerator::new(vec![
        Ok(vec![STAGE_ONE_TEXT.to_string()]),
        Ok(vec![duplicated.to_string()]),
    ]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("10.0.0.1", None);

    let activities = service.handle_search(&ctx, body()).await.unwrap();

    let ids: Vec<&str> = activities.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["activity-1", "activity-2", "activity-3"]);
}

#[tokio::test]
async fn test_run_pipeline_surfaces_the_underlying_error() {
    let generator = ScriptedGenerator::new(vec![Err(GeminiError::UpstreamStatus {
        status: 503,
        body: "overloaded".to_string(),
    })]);
    let service = service_with(Arc::clone(&generator));
    let ctx = RequestContext::new("cli", None);

    let query: SearchQuery = serde_json::from_slice(body()).unwrap();
    let error = service.run_pipeline(&ctx, &query).await.unwrap_err();

    match error {
        PipelineError::Generation(GeminiError::UpstreamStatus { status, .. }) => {
            assert_eq!(status, 503);
        }
        other => panic!("expected an upstream generation error, got {other:?}"),
    }
}
