//! Pipeline Integration Tests
//!
//! Drives full analysis runs through the scheduler against a scripted
//! reasoning client: the fully-successful and fatal-failure scenarios,
//! byte-for-byte determinism, degrade-only verdicts, the retry bound, and
//! sequential step isolation.

use std::sync::Arc;

use serde_json::json;

use redline::{DocumentScheduler, EngineConfig};
use redline_core::{Document, RunStatus, Segment, Severity, StepStatus};
use redline_pipeline::{FailureMode, HeuristicConfig, RetryPolicy, StepDefinition, StepKind};
use redline_reasoning::{ReasoningError, ScriptedClient};

// ============================================================================
// Helpers
// ============================================================================

fn three_segment_document() -> Document {
    Document::new(
        "contract-1",
        vec![
            Segment::new("s1", "The term of this agreement is five years.", 0),
            Segment::new("s2", "Either party may terminate at its sole discretion.", 1),
            Segment::new("s3", "Liability is capped at fees paid.", 2),
        ],
    )
    .unwrap()
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        attempt_timeout_ms: 500,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
    }
}

/// Three-step pipeline used by the scenario tests; every step is fatal
/// unless a test overrides it.
fn three_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(StepKind::ClauseExtraction, 0).with_policy(fast_policy()),
        StepDefinition::new(StepKind::AmbiguityScan, 1).with_policy(fast_policy()),
        StepDefinition::new(StepKind::RiskClassification, 2).with_policy(fast_policy()),
    ]
}

fn config_with_steps(steps: Vec<StepDefinition>) -> EngineConfig {
    EngineConfig {
        heuristics: HeuristicConfig::none(),
        steps,
        ..EngineConfig::default()
    }
}

fn medium_finding(segment_id: &str, description: &str) -> serde_json::Value {
    json!({
        "findings": [{
            "category": "ambiguity",
            "severity": "medium",
            "confidence": 0.9,
            "segmentId": segment_id,
            "description": description
        }],
        "fragments": [{"key": "note", "value": description}]
    })
}

fn script_success(client: &ScriptedClient) {
    client.always_answer("clause_extraction", medium_finding("s1", "vague term length"));
    client.always_answer("ambiguity_scan", medium_finding("s2", "one-sided termination"));
    client.always_answer("risk_classification", medium_finding("s3", "low liability cap"));
}

async fn run(client: Arc<ScriptedClient>, steps: Vec<StepDefinition>) -> redline::AnalysisReport {
    let scheduler = DocumentScheduler::new(config_with_steps(steps), client).unwrap();
    let handle = scheduler.submit(three_segment_document()).unwrap();
    handle.report().await.unwrap()
}

// ============================================================================
// Scenario: Fully Successful Run
// ============================================================================

#[tokio::test]
async fn test_successful_three_step_run() {
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);

    let report = run(client, three_steps()).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.findings.len(), 3);
    assert_eq!(report.verdict.bucket, Severity::Medium);
    assert!(!report.verdict.degraded);
    assert_eq!(report.step_summaries.len(), 3);
    for summary in &report.step_summaries {
        assert_eq!(summary.status, StepStatus::Succeeded);
        assert_eq!(summary.attempts, 1);
    }
}

// ============================================================================
// Scenario: Fatal Mid-Pipeline Failure
// ============================================================================

#[tokio::test]
async fn test_fatal_failure_mid_pipeline_keeps_completed_work() {
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);
    client.always_fail(
        "ambiguity_scan",
        ReasoningError::InvalidRequest {
            message: "request rejected".to_string(),
        },
    );

    let report = run(client.clone(), three_steps()).await;

    assert_eq!(report.status, RunStatus::Failed);
    // Step 1's finding survives the abort; step 3 was never invoked.
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].description, "vague term length");
    assert!(report.verdict.degraded);
    assert_eq!(client.invocation_count("risk_classification"), 0);

    assert_eq!(report.step_summaries.len(), 2);
    assert_eq!(report.step_summaries[0].status, StepStatus::Succeeded);
    assert_eq!(report.step_summaries[1].status, StepStatus::Failed);
}

// ============================================================================
// Determinism
// ============================================================================

#[tokio::test]
async fn test_identical_scripts_produce_identical_reports() {
    let mut serialized = Vec::new();
    for _ in 0..3 {
        let client = Arc::new(ScriptedClient::new());
        script_success(&client);
        let report = run(client, three_steps()).await;

        // The generation timestamp is the one nondeterministic field.
        let findings = serde_json::to_string(&report.findings).unwrap();
        let verdict = serde_json::to_string(&report.verdict).unwrap();
        let summaries: Vec<(String, StepStatus)> = report
            .step_summaries
            .iter()
            .map(|s| (s.step_id.clone(), s.status))
            .collect();
        serialized.push((findings, verdict, summaries));
    }
    assert_eq!(serialized[0], serialized[1]);
    assert_eq!(serialized[1], serialized[2]);
}

// ============================================================================
// Degrade-Only on Failure
// ============================================================================

#[tokio::test]
async fn test_transient_failure_never_improves_the_bucket() {
    // Baseline: all three steps succeed.
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);
    let baseline = run(client, three_steps()).await;
    assert_eq!(baseline.verdict.bucket, Severity::Medium);

    // Same document, but the scan exhausts its retries on transient errors.
    let steps = vec![
        StepDefinition::new(StepKind::ClauseExtraction, 0).with_policy(fast_policy()),
        StepDefinition::new(StepKind::AmbiguityScan, 1)
            .with_failure_mode(FailureMode::Skippable)
            .with_policy(fast_policy()),
        StepDefinition::new(StepKind::RiskClassification, 2).with_policy(fast_policy()),
    ];
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);
    client.always_fail(
        "ambiguity_scan",
        ReasoningError::Timeout { timeout_ms: 5 },
    );
    let degraded = run(client, steps).await;

    assert_eq!(degraded.status, RunStatus::Completed);
    assert!(degraded.verdict.degraded);
    // The failure costs a finding but must not soften the verdict.
    assert_eq!(degraded.findings.len(), 2);
    assert!(degraded.verdict.bucket >= baseline.verdict.bucket);
}

// ============================================================================
// Retry Bound
// ============================================================================

#[tokio::test]
async fn test_retry_budget_spent_exactly() {
    let always_transient = Arc::new(ScriptedClient::new());
    always_transient.always_fail(
        "clause_extraction",
        ReasoningError::ServerError {
            message: "upstream down".to_string(),
            status: Some(500),
        },
    );

    let steps = vec![StepDefinition::new(StepKind::ClauseExtraction, 0).with_policy(
        RetryPolicy {
            max_retries: 3,
            attempt_timeout_ms: 500,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        },
    )];
    let report = run(always_transient.clone(), steps).await;

    // max_retries = 3 means exactly 4 invocation attempts.
    assert_eq!(always_transient.invocation_count("clause_extraction"), 4);
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.step_summaries[0].status, StepStatus::Failed);
    assert_eq!(report.step_summaries[0].attempts, 4);
}

// ============================================================================
// Sequential Isolation
// ============================================================================

#[tokio::test]
async fn test_steps_invoked_strictly_in_order() {
    let client = Arc::new(ScriptedClient::new());
    // Any out-of-order invocation resolves as a permanent error and would
    // fail the run below.
    client.expect_order(vec!["clause_extraction", "ambiguity_scan", "risk_classification"]);
    script_success(&client);

    let report = run(client, three_steps()).await;
    assert_eq!(report.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_context_never_contains_later_step_fragments() {
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);

    run(client.clone(), three_steps()).await;

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    // Step 1 sees an empty context; step 2 sees only step 1's fragments;
    // step 3 sees steps 1 and 2.
    assert_eq!(calls[0].context, json!({}));
    assert!(calls[1].context.get("clause_extraction").is_some());
    assert!(calls[1].context.get("ambiguity_scan").is_none());
    assert!(calls[1].context.get("risk_classification").is_none());
    assert!(calls[2].context.get("ambiguity_scan").is_some());
    assert!(calls[2].context.get("risk_classification").is_none());
}

// ============================================================================
// Heuristics Augment Step Findings
// ============================================================================

#[tokio::test]
async fn test_heuristic_findings_are_additive() {
    let client = Arc::new(ScriptedClient::new());
    script_success(&client);

    // Same run as the successful scenario, but with the standard rule set.
    let config = EngineConfig {
        steps: three_steps(),
        ..EngineConfig::default()
    };
    let scheduler = DocumentScheduler::new(config, client).unwrap();
    let handle = scheduler.submit(three_segment_document()).unwrap();
    let report = handle.report().await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    // All three step findings are retained...
    let from_steps = report
        .findings
        .iter()
        .filter(|f| f.origin != redline_core::FindingOrigin::Heuristic)
        .count();
    assert_eq!(from_steps, 3);
    // ...and the sole-discretion term rule adds a heuristic finding,
    // ordered after the step findings.
    let heuristic: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.origin == redline_core::FindingOrigin::Heuristic)
        .collect();
    assert!(!heuristic.is_empty());
    assert_eq!(
        report.findings.last().unwrap().origin,
        redline_core::FindingOrigin::Heuristic
    );
}
