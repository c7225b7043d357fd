//! Step Registry and Policy Table
//!
//! The analysis pipeline is an explicit, enumerated registry of steps
//! (`StepKind`) bound into a versioned, immutable `StepTable` that is loaded
//! once per engine and never mutated during execution. Each `StepDefinition`
//! carries its position, the prior steps it consumes, a declared failure
//! mode, and a retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use redline_core::{ContextFragment, RiskFinding, RunError, RunResult, StepStatus, StepSummary};
use redline_reasoning::ReasoningError;

// ============================================================================
// Step Registry
// ============================================================================

/// The enumerated analysis steps, in canonical pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Inventory the clauses present in the document
    ClauseExtraction,
    /// Flag wording open to more than one reading
    AmbiguityScan,
    /// Map obligations onto the parties they bind
    ObligationMapping,
    /// Classify detected items into risk categories
    RiskClassification,
    /// Score classified risks for the final verdict
    RiskScoring,
}

impl StepKind {
    /// Stable identifier used in summaries, origins, and events.
    pub fn id(&self) -> &'static str {
        match self {
            StepKind::ClauseExtraction => "clause_extraction",
            StepKind::AmbiguityScan => "ambiguity_scan",
            StepKind::ObligationMapping => "obligation_mapping",
            StepKind::RiskClassification => "risk_classification",
            StepKind::RiskScoring => "risk_scoring",
        }
    }

    /// Directive handed to the reasoning service. Opaque to the engine;
    /// the service decides what to do with it.
    pub fn directive(&self) -> &'static str {
        match self {
            StepKind::ClauseExtraction => "extract_clause_inventory",
            StepKind::AmbiguityScan => "scan_for_ambiguous_wording",
            StepKind::ObligationMapping => "map_obligations_to_parties",
            StepKind::RiskClassification => "classify_risk_items",
            StepKind::RiskScoring => "score_classified_risks",
        }
    }

    /// All steps in canonical order.
    pub fn all() -> [StepKind; 5] {
        [
            StepKind::ClauseExtraction,
            StepKind::AmbiguityScan,
            StepKind::ObligationMapping,
            StepKind::RiskClassification,
            StepKind::RiskScoring,
        ]
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ============================================================================
// Failure Mode & Retry Policy
// ============================================================================

/// How the orchestrator treats a terminal step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// A terminal failure aborts the whole run
    Fatal,
    /// A terminal failure is recorded as `Skipped` and the run continues
    Skippable,
}

impl Default for FailureMode {
    fn default() -> Self {
        FailureMode::Fatal
    }
}

/// Retry policy for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries after the first attempt; `max_retries = N` allows N+1 attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Timeout applied to each attempt independently
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Backoff before the first retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on the backoff between attempts
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry that follows attempt `attempt` (0-based).
    /// Doubles per attempt, capped at `max_backoff_ms`, so the schedule is
    /// monotonically non-decreasing.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Per-attempt timeout as a `Duration`.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

// ============================================================================
// Step Definition & Table
// ============================================================================

/// One configured step of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// Stable step identifier
    pub id: String,
    /// Ordered position in the pipeline
    pub position: u32,
    /// Which registry entry this step is
    pub kind: StepKind,
    /// Ids of prior steps whose outputs this step requires
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Declared fatality of a terminal failure
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Retry policy for this step
    #[serde(default)]
    pub policy: RetryPolicy,
}

impl StepDefinition {
    /// Create a definition for `kind` at `position` with defaults.
    pub fn new(kind: StepKind, position: u32) -> Self {
        Self {
            id: kind.id().to_string(),
            position,
            kind,
            consumes: Vec::new(),
            failure_mode: FailureMode::default(),
            policy: RetryPolicy::default(),
        }
    }

    /// Declare required prior steps.
    pub fn consumes(mut self, step_ids: Vec<&str>) -> Self {
        self.consumes = step_ids.into_iter().map(String::from).collect();
        self
    }

    /// Set the failure mode.
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Set the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The versioned, immutable step table of one engine.
///
/// Validated on construction: positions strictly increasing, ids unique, and
/// `consumes` may only reference earlier steps. A violation is a
/// configuration defect, reported as `InvariantViolation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTable {
    steps: Vec<StepDefinition>,
}

impl StepTable {
    /// Build a table from definitions, validating the ordering invariants.
    pub fn new(steps: Vec<StepDefinition>) -> RunResult<Self> {
        let mut last_position: Option<u32> = None;
        let mut seen_ids: Vec<&str> = Vec::new();

        for step in &steps {
            if let Some(prev) = last_position {
                if step.position <= prev {
                    return Err(RunError::invariant(format!(
                        "step {} position {} not strictly increasing",
                        step.id, step.position
                    )));
                }
            }
            if seen_ids.contains(&step.id.as_str()) {
                return Err(RunError::invariant(format!("duplicate step id {}", step.id)));
            }
            for consumed in &step.consumes {
                if !seen_ids.contains(&consumed.as_str()) {
                    return Err(RunError::invariant(format!(
                        "step {} consumes {} which is not an earlier step",
                        step.id, consumed
                    )));
                }
            }
            seen_ids.push(step.id.as_str());
            last_position = Some(step.position);
        }

        Ok(Self { steps })
    }

    /// The default five-step analysis pipeline.
    pub fn standard() -> Self {
        let steps = vec![
            StepDefinition::new(StepKind::ClauseExtraction, 0),
            StepDefinition::new(StepKind::AmbiguityScan, 1)
                .consumes(vec!["clause_extraction"])
                .with_failure_mode(FailureMode::Skippable),
            StepDefinition::new(StepKind::ObligationMapping, 2)
                .consumes(vec!["clause_extraction"])
                .with_failure_mode(FailureMode::Skippable),
            StepDefinition::new(StepKind::RiskClassification, 3)
                .consumes(vec!["clause_extraction"]),
            StepDefinition::new(StepKind::RiskScoring, 4)
                .consumes(vec!["risk_classification"])
                .with_failure_mode(FailureMode::Skippable),
        ];
        // The standard table satisfies the invariants by construction.
        Self { steps }
    }

    /// Steps in pipeline order.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the table has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step's position by id.
    pub fn position_of(&self, step_id: &str) -> Option<u32> {
        self.steps
            .iter()
            .find(|s| s.id == step_id)
            .map(|s| s.position)
    }
}

// ============================================================================
// Step Result
// ============================================================================

/// Terminal outcome of executing one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Step identifier
    pub step_id: String,
    /// Terminal status
    pub status: StepStatus,
    /// Findings the step produced
    pub findings: Vec<RiskFinding>,
    /// Context fragments carried forward to later steps
    pub fragments: Vec<ContextFragment>,
    /// Step-level confidence indicator, when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Invocation attempts made
    pub attempts: u32,
    /// Wall-clock latency across all attempts
    pub latency_ms: u64,
    /// Last error cause for failed or skipped steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReasoningError>,
}

impl StepResult {
    /// Create a succeeded result.
    pub fn succeeded(
        step_id: &str,
        findings: Vec<RiskFinding>,
        fragments: Vec<ContextFragment>,
        confidence: Option<f32>,
        attempts: u32,
        latency_ms: u64,
    ) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Succeeded,
            findings,
            fragments,
            confidence,
            attempts,
            latency_ms,
            error: None,
        }
    }

    /// Create a failed result carrying the last error cause.
    pub fn failed(step_id: &str, attempts: u32, latency_ms: u64, error: ReasoningError) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Failed,
            findings: Vec::new(),
            fragments: Vec::new(),
            confidence: None,
            attempts,
            latency_ms,
            error: Some(error),
        }
    }

    /// Create a skipped result. `attempts` is zero when the step was never
    /// invoked (e.g. a required input was missing).
    pub fn skipped(step_id: &str, attempts: u32, latency_ms: u64, error: Option<ReasoningError>) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Skipped,
            findings: Vec::new(),
            fragments: Vec::new(),
            confidence: None,
            attempts,
            latency_ms,
            error,
        }
    }

    /// Execution summary for the report.
    pub fn summary(&self) -> StepSummary {
        StepSummary {
            step_id: self.step_id.clone(),
            status: self.status,
            attempts: self.attempts,
            latency_ms: self.latency_ms,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
