//! Step Executor
//!
//! Runs one analysis step against one document's accumulated context,
//! applying the step's retry policy. Transient errors are retried with
//! exponential backoff; permanent errors fail the step immediately. The
//! executor never raises past its boundary: every invocation resolves to a
//! terminal `StepResult`, and the orchestrator decides fatality.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

use redline_core::{
    AnalysisContext, ContextFragment, Document, RiskCategory, RiskFinding, SegmentRef, Severity,
};
use redline_reasoning::{
    RawStepAnswer, ReasoningClient, ReasoningError, ReasoningRequest, ReasoningResult,
};

use crate::step::{StepDefinition, StepResult};

// ============================================================================
// Answer Parsing
// ============================================================================

/// Wire shape of a step answer's `content` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerPayload {
    #[serde(default)]
    findings: Vec<AnswerFinding>,
    #[serde(default)]
    fragments: Vec<AnswerFragment>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerFinding {
    category: RiskCategory,
    severity: Severity,
    confidence: f32,
    segment_id: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerFragment {
    key: String,
    value: Value,
}

/// Parsed step outputs: findings, carried-forward fragments, and the
/// step-level confidence indicator.
#[derive(Debug)]
pub struct ParsedAnswer {
    pub findings: Vec<RiskFinding>,
    pub fragments: Vec<ContextFragment>,
    pub confidence: Option<f32>,
}

/// Turn a raw answer into typed step outputs.
///
/// Pure and side-effect-free. Any shape violation, including a finding that
/// references a segment the document does not contain, is a permanent
/// `MalformedAnswer`: the service broke the step contract, and retrying the
/// same request will not fix it.
pub fn parse_answer(
    def: &StepDefinition,
    document: &Document,
    answer: &RawStepAnswer,
) -> ReasoningResult<ParsedAnswer> {
    let payload: AnswerPayload = serde_json::from_value(answer.content.clone())
        .map_err(|e| ReasoningError::malformed(format!("step {}: {}", def.id, e)))?;

    let mut findings = Vec::with_capacity(payload.findings.len());
    for item in payload.findings {
        let mut finding = RiskFinding::new(
            item.category,
            item.severity,
            item.confidence,
            item.description,
            redline_core::FindingOrigin::step(&def.id),
        );
        if let Some(segment_id) = item.segment_id {
            let segment = document.segment(&segment_id).ok_or_else(|| {
                ReasoningError::malformed(format!(
                    "step {}: finding references unknown segment {}",
                    def.id, segment_id
                ))
            })?;
            finding = finding.at(SegmentRef::to(segment));
        }
        findings.push(finding);
    }

    let fragments = payload
        .fragments
        .into_iter()
        .map(|f| ContextFragment::new(&def.id, f.key, f.value))
        .collect();

    Ok(ParsedAnswer {
        findings,
        fragments,
        confidence: payload.confidence.map(|c| c.clamp(0.0, 1.0)),
    })
}

// ============================================================================
// Step Executor
// ============================================================================

/// Executes single steps against a reasoning client.
pub struct StepExecutor {
    client: Arc<dyn ReasoningClient>,
}

impl StepExecutor {
    /// Create an executor over the given client.
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    /// Execute one step to a terminal `StepResult`.
    ///
    /// Attempt count is bounded by `max_retries` (N retries = N+1 attempts);
    /// each attempt is independently subject to the step's timeout, with a
    /// timed-out attempt counted as transient. Between transient failures
    /// the executor backs off per the policy schedule, honoring a rate-limit
    /// `retry_after` hint when the service provides one.
    pub async fn execute(
        &self,
        def: &StepDefinition,
        document: &Document,
        context: &AnalysisContext,
    ) -> StepResult {
        let started = Instant::now();
        let attempt_timeout = def.policy.attempt_timeout();
        let mut last_error: Option<ReasoningError> = None;

        for attempt in 0..=def.policy.max_retries {
            let request = ReasoningRequest::new(
                &def.id,
                def.kind.directive(),
                &document.id,
                document.segments.clone(),
                context.merged(),
            );

            let outcome = match tokio::time::timeout(attempt_timeout, self.client.invoke(request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ReasoningError::Timeout {
                    timeout_ms: def.policy.attempt_timeout_ms,
                }),
            };

            match outcome {
                Ok(answer) => match parse_answer(def, document, &answer) {
                    Ok(parsed) => {
                        let latency_ms = started.elapsed().as_millis() as u64;
                        tracing::debug!(
                            step = %def.id,
                            document = %document.id,
                            attempts = attempt + 1,
                            latency_ms,
                            findings = parsed.findings.len(),
                            "step succeeded"
                        );
                        return StepResult::succeeded(
                            &def.id,
                            parsed.findings,
                            parsed.fragments,
                            parsed.confidence,
                            attempt + 1,
                            latency_ms,
                        );
                    }
                    Err(err) => {
                        // Parse failures are permanent by policy.
                        tracing::warn!(step = %def.id, error = %err, "unparseable step answer");
                        return StepResult::failed(
                            &def.id,
                            attempt + 1,
                            started.elapsed().as_millis() as u64,
                            err,
                        );
                    }
                },
                Err(err) => {
                    if !err.is_transient() {
                        tracing::warn!(step = %def.id, error = %err, "permanent step failure");
                        return StepResult::failed(
                            &def.id,
                            attempt + 1,
                            started.elapsed().as_millis() as u64,
                            err,
                        );
                    }

                    if attempt < def.policy.max_retries {
                        let backoff = retry_after_hint(&err)
                            .unwrap_or_else(|| def.policy.backoff_for_attempt(attempt));
                        tracing::warn!(
                            step = %def.id,
                            attempt = attempt + 1,
                            max_attempts = def.policy.max_retries + 1,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "transient step failure, backing off"
                        );
                        last_error = Some(err);
                        tokio::time::sleep(backoff).await;
                    } else {
                        last_error = Some(err);
                    }
                }
            }
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        let cause = last_error.unwrap_or_else(|| {
            ReasoningError::network("retry budget exhausted with no recorded cause")
        });
        tracing::warn!(
            step = %def.id,
            attempts = def.policy.max_retries + 1,
            error = %cause,
            "step retry budget exhausted"
        );
        StepResult::failed(&def.id, def.policy.max_retries + 1, latency_ms, cause)
    }
}

/// Rate-limit responses may carry an explicit wait; prefer it over the
/// policy schedule.
fn retry_after_hint(err: &ReasoningError) -> Option<Duration> {
    match err {
        ReasoningError::RateLimited {
            retry_after: Some(secs),
            ..
        } => Some(Duration::from_secs(u64::from(*secs))),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
