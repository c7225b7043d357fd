//! Report JSON Contract Tests
//!
//! The API layer consumes the `AnalysisReport` as JSON; these tests pin the
//! serialized field names and nesting it relies on.

use std::sync::Arc;

use serde_json::{json, Value};

use redline::{DocumentScheduler, EngineConfig};
use redline_core::{Document, Segment};
use redline_pipeline::{HeuristicConfig, StepDefinition, StepKind};
use redline_reasoning::ScriptedClient;

async fn completed_report_json() -> Value {
    let client = Arc::new(ScriptedClient::new());
    client.always_answer(
        "clause_extraction",
        json!({
            "findings": [{
                "category": "unfavorable_term",
                "severity": "high",
                "confidence": 0.75,
                "segmentId": "s1",
                "description": "unilateral termination right"
            }],
            "fragments": [{"key": "clauses", "value": ["termination"]}],
            "confidence": 0.9
        }),
    );

    let config = EngineConfig {
        heuristics: HeuristicConfig::none(),
        steps: vec![StepDefinition::new(StepKind::ClauseExtraction, 0)],
        ..EngineConfig::default()
    };
    let scheduler = DocumentScheduler::new(config, client).unwrap();
    let handle = scheduler
        .submit(
            Document::new(
                "contract-9",
                vec![Segment::new("s1", "Provider may terminate at any time.", 0)],
            )
            .unwrap(),
        )
        .unwrap();
    let report = handle.report().await.unwrap();
    serde_json::to_value(&report).unwrap()
}

#[tokio::test]
async fn test_report_top_level_fields() {
    let json = completed_report_json().await;

    assert_eq!(json["documentId"], "contract-9");
    assert_eq!(json["status"], "completed");
    assert!(json["findings"].is_array());
    assert!(json["verdict"].is_object());
    assert!(json["stepSummaries"].is_array());
    assert!(json["generatedAt"].is_string());
}

#[tokio::test]
async fn test_finding_and_verdict_fields() {
    let json = completed_report_json().await;

    let finding = &json["findings"][0];
    assert_eq!(finding["category"], "unfavorable_term");
    assert_eq!(finding["severity"], "high");
    assert_eq!(finding["confidence"], 0.75);
    assert_eq!(finding["segmentRef"]["segmentId"], "s1");
    assert_eq!(finding["description"], "unilateral termination right");
    assert_eq!(finding["origin"]["type"], "reasoning_step");
    assert_eq!(finding["origin"]["step_id"], "clause_extraction");

    let verdict = &json["verdict"];
    assert_eq!(verdict["bucket"], "high");
    assert!(verdict["score"].as_f64().unwrap() > 0.0);
    assert_eq!(verdict["degraded"], false);
    assert_eq!(verdict["contributing"][0], 0);
}

#[tokio::test]
async fn test_step_summary_fields() {
    let json = completed_report_json().await;

    let summary = &json["stepSummaries"][0];
    assert_eq!(summary["stepId"], "clause_extraction");
    assert_eq!(summary["status"], "succeeded");
    assert_eq!(summary["attempts"], 1);
    assert!(summary["latencyMs"].is_number());
}
