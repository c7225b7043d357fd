//! Scripted In-Memory Client
//!
//! A deterministic `ReasoningClient` whose answers are scripted per step.
//! This is the test seam for the whole engine: it can replay fixed answers,
//! inject transient or permanent failures, delay resolution to exercise
//! timeouts and cancellation, and record every invocation for order
//! assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::ReasoningClient;
use crate::error::{ReasoningError, ReasoningResult};
use crate::types::{RawStepAnswer, ReasoningRequest};

/// One scripted outcome for a step invocation.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Resolve with this answer payload
    Answer(Value),
    /// Fail with this error
    Error(ReasoningError),
}

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Step that was invoked
    pub step_id: String,
    /// Context the caller handed over
    pub context: Value,
}

#[derive(Debug, Default)]
struct Script {
    /// Outcomes consumed in order, per step
    queued: HashMap<String, VecDeque<ScriptedOutcome>>,
    /// Outcome replayed once the queue for a step is empty
    persistent: HashMap<String, ScriptedOutcome>,
    /// Recorded calls in invocation order
    calls: Vec<RecordedCall>,
    /// Expected invocation order of step ids, if asserted
    expected_order: Option<Vec<String>>,
    /// Cursor into `expected_order`
    order_cursor: usize,
}

/// Deterministic scripted reasoning client.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: Mutex<Script>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl ScriptedClient {
    /// Create a client with an empty script. Unscripted steps resolve with
    /// an empty answer payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one outcome for the given step; queued outcomes are consumed
    /// in order, one per invocation.
    pub fn enqueue(&self, step_id: &str, outcome: ScriptedOutcome) -> &Self {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script
            .queued
            .entry(step_id.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Queue a successful answer for the given step.
    pub fn answer(&self, step_id: &str, content: Value) -> &Self {
        self.enqueue(step_id, ScriptedOutcome::Answer(content))
    }

    /// Replay the same answer for every invocation of the step once the
    /// queue is empty.
    pub fn always_answer(&self, step_id: &str, content: Value) -> &Self {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script
            .persistent
            .insert(step_id.to_string(), ScriptedOutcome::Answer(content));
        self
    }

    /// Replay the same error for every invocation of the step once the
    /// queue is empty.
    pub fn always_fail(&self, step_id: &str, error: ReasoningError) -> &Self {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script
            .persistent
            .insert(step_id.to_string(), ScriptedOutcome::Error(error));
        self
    }

    /// Delay every invocation of the step by `delay` before resolving.
    pub fn with_delay(&self, step_id: &str, delay: Duration) -> &Self {
        let mut delays = self.delays.lock().unwrap_or_else(|e| e.into_inner());
        delays.insert(step_id.to_string(), delay);
        self
    }

    /// Assert that steps are invoked in exactly this id order (retries of
    /// one step repeat its entry). An out-of-order invocation resolves as
    /// a permanent `InvalidRequest` error.
    pub fn expect_order(&self, step_ids: Vec<&str>) -> &Self {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.expected_order = Some(step_ids.into_iter().map(String::from).collect());
        script.order_cursor = 0;
        self
    }

    /// All recorded calls in invocation order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        let script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.calls.clone()
    }

    /// Number of invocations recorded for the given step.
    pub fn invocation_count(&self, step_id: &str) -> usize {
        let script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.calls.iter().filter(|c| c.step_id == step_id).count()
    }

    fn resolve(&self, request: &ReasoningRequest) -> ReasoningResult<RawStepAnswer> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.calls.push(RecordedCall {
            step_id: request.step_id.clone(),
            context: request.context.clone(),
        });

        if let Some(expected) = script.expected_order.clone() {
            let cursor = script.order_cursor;
            let matches_current = expected.get(cursor) == Some(&request.step_id);
            // A step may be invoked repeatedly (retries); advance only once
            // the current step has been seen and the next expected id shows up.
            let current_seen = script.calls[..script.calls.len() - 1]
                .iter()
                .any(|c| Some(&c.step_id) == expected.get(cursor));
            let matches_next = current_seen && expected.get(cursor + 1) == Some(&request.step_id);
            if matches_next {
                script.order_cursor = cursor + 1;
            } else if !matches_current {
                return Err(ReasoningError::InvalidRequest {
                    message: format!(
                        "step {} invoked out of order (expected {:?} at {})",
                        request.step_id,
                        expected.get(cursor),
                        cursor
                    ),
                });
            }
        }

        if let Some(queue) = script.queued.get_mut(&request.step_id) {
            if let Some(outcome) = queue.pop_front() {
                return match outcome {
                    ScriptedOutcome::Answer(content) => Ok(RawStepAnswer::new(content)),
                    ScriptedOutcome::Error(err) => Err(err),
                };
            }
        }

        match script.persistent.get(&request.step_id) {
            Some(ScriptedOutcome::Answer(content)) => Ok(RawStepAnswer::new(content.clone())),
            Some(ScriptedOutcome::Error(err)) => Err(err.clone()),
            None => Ok(RawStepAnswer::new(json!({
                "findings": [],
                "fragments": [],
            }))),
        }
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn invoke(&self, request: ReasoningRequest) -> ReasoningResult<RawStepAnswer> {
        let delay = {
            let delays = self.delays.lock().unwrap_or_else(|e| e.into_inner());
            delays.get(&request.step_id).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.resolve(&request)
    }
}
