//! Scheduler Integration Tests
//!
//! Lifecycle tests for the document scheduler: cooperative cancellation of
//! an in-flight run, FIFO admission with bounded concurrency, and
//! backpressure rejection of excess submissions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use redline::{AnalysisHandle, DocumentScheduler, EngineConfig, SubmitError};
use redline_core::{Document, RunStatus, Segment};
use redline_pipeline::{HeuristicConfig, RetryPolicy, RunEvent, StepDefinition, StepKind};
use redline_reasoning::ScriptedClient;

// ============================================================================
// Helpers
// ============================================================================

fn document(id: &str) -> Document {
    Document::new(
        id,
        vec![
            Segment::new("s1", "The parties shall cooperate in good faith.", 0),
            Segment::new("s2", "This agreement renews automatically.", 1),
        ],
    )
    .unwrap()
}

fn two_steps(attempt_timeout_ms: u64) -> Vec<StepDefinition> {
    let policy = RetryPolicy {
        max_retries: 0,
        attempt_timeout_ms,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
    };
    vec![
        StepDefinition::new(StepKind::ClauseExtraction, 0).with_policy(policy.clone()),
        StepDefinition::new(StepKind::AmbiguityScan, 1).with_policy(policy),
    ]
}

fn config(max_concurrent: usize, queue_depth: usize, steps: Vec<StepDefinition>) -> EngineConfig {
    EngineConfig {
        max_concurrent,
        queue_depth,
        heuristics: HeuristicConfig::none(),
        steps,
        ..EngineConfig::default()
    }
}

fn empty_answers(client: &ScriptedClient) {
    client.always_answer("clause_extraction", json!({"findings": [], "fragments": []}));
    client.always_answer("ambiguity_scan", json!({"findings": [], "fragments": []}));
}

// ============================================================================
// Scenario: Cancellation Mid-Run
// ============================================================================

#[tokio::test]
async fn test_cancel_while_second_step_in_flight() {
    let client = Arc::new(ScriptedClient::new());
    empty_answers(&client);
    // Step 2 stalls long enough for the cancel to land mid-call.
    client.with_delay("ambiguity_scan", Duration::from_secs(5));

    let step_timeout = Duration::from_secs(10);
    let scheduler = DocumentScheduler::new(
        config(1, 0, two_steps(step_timeout.as_millis() as u64)),
        client,
    )
    .unwrap();
    let handle = scheduler.submit(document("doc-1")).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.cancel(&handle);

    let started = Instant::now();
    let report = handle.report().await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    // The run resolves well within one step-timeout of the cancel.
    assert!(started.elapsed() < step_timeout);
    // Step 1 resolved before the cancel; step 2 left no record.
    assert_eq!(report.step_summaries.len(), 1);
    assert_eq!(report.step_summaries[0].step_id, "clause_extraction");
}

// ============================================================================
// Backpressure
// ============================================================================

#[tokio::test]
async fn test_excess_submissions_rejected_without_disturbing_others() {
    let client = Arc::new(ScriptedClient::new());
    empty_answers(&client);
    client.with_delay("clause_extraction", Duration::from_millis(150));

    let scheduler = DocumentScheduler::new(config(2, 2, two_steps(5_000)), client).unwrap();

    let accepted: Vec<AnalysisHandle> = (0..4)
        .map(|i| scheduler.submit(document(&format!("doc-{}", i))).unwrap())
        .collect();
    assert_eq!(scheduler.in_flight(), 4);

    // max_concurrent + queue_depth slots are taken; the fifth is rejected.
    let rejected = scheduler.submit(document("doc-4")).unwrap_err();
    assert!(rejected.is_retryable());
    assert!(matches!(rejected, SubmitError::QueueFull { capacity: 4 }));

    // Every accepted submission still runs to completion.
    for handle in accepted {
        let report = handle.report().await.unwrap();
        assert_eq!(report.status, RunStatus::Completed);
    }

    // With capacity free again, a retried submission is admitted.
    let retried = scheduler.submit(document("doc-4")).unwrap();
    assert_eq!(retried.report().await.unwrap().status, RunStatus::Completed);
}

// ============================================================================
// Concurrency Bound
// ============================================================================

#[tokio::test]
async fn test_concurrent_runs_bounded_and_independent() {
    let client = Arc::new(ScriptedClient::new());
    empty_answers(&client);
    client.with_delay("clause_extraction", Duration::from_millis(100));

    let scheduler = DocumentScheduler::new(config(2, 4, two_steps(5_000)), client.clone()).unwrap();

    let handles: Vec<AnalysisHandle> = (0..6)
        .map(|i| scheduler.submit(document(&format!("doc-{}", i))).unwrap())
        .collect();

    for handle in handles {
        assert_eq!(handle.report().await.unwrap().status, RunStatus::Completed);
    }
    assert_eq!(scheduler.in_flight(), 0);
    // Six documents, two steps each.
    assert_eq!(client.calls().len(), 12);
}

// ============================================================================
// Run Events
// ============================================================================

#[tokio::test]
async fn test_events_delivered_for_scheduled_run() {
    let client = Arc::new(ScriptedClient::new());
    empty_answers(&client);

    let scheduler = DocumentScheduler::new(config(1, 0, two_steps(5_000)), client).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = scheduler
        .submit_with_events(document("doc-1"), tx)
        .unwrap();
    handle.report().await.unwrap();

    let mut saw_start = false;
    let mut saw_finish = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            RunEvent::RunStarted { ref document_id, .. } => {
                assert_eq!(document_id, "doc-1");
                saw_start = true;
            }
            RunEvent::RunFinished { status, .. } => {
                assert_eq!(status, RunStatus::Completed);
                saw_finish = true;
            }
            _ => {}
        }
    }
    assert!(saw_start && saw_finish);
}
