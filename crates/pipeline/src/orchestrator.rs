//! Pipeline Orchestrator
//!
//! The per-document state machine that sequences analysis steps, carries the
//! accumulated context forward, and decides continue/skip/abort at each
//! transition. One orchestrator instance owns one `PipelineRun`; nothing it
//! mutates is shared with other documents.
//!
//! `run` fails only on invariant violations (programming defects). Every
//! runtime condition, including fatal step failures, deadline breach, and
//! cancellation, resolves to a terminal `AnalysisReport` that keeps all
//! findings accumulated up to that point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use redline_core::{
    AnalysisContext, AnalysisReport, Document, RiskFinding, RunError, RunResult, RunStatus,
    StepStatus, StepSummary,
};
use redline_reasoning::ReasoningClient;

use crate::aggregate::{RiskAggregator, ScoringConfig};
use crate::executor::StepExecutor;
use crate::heuristics::HeuristicEngine;
use crate::report::ReportBuilder;
use crate::step::{FailureMode, StepResult, StepTable};

// ============================================================================
// Run State Machine
// ============================================================================

/// Explicit run state. Valid transitions:
/// `Pending → Running(0) → Running(1) → … → Aggregating → Completed`, with
/// `Failed` and `Cancelled` reachable from `Pending` and any `Running` state.
/// Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Accepted, not yet started
    Pending,
    /// Executing the step at this index
    Running { step: usize },
    /// Steps resolved; heuristics and aggregation in progress
    Aggregating,
    /// Terminal: report built from a fully successful pipeline
    Completed,
    /// Terminal: a fatal condition ended the run
    Failed,
    /// Terminal: cancelled on external request
    Cancelled,
}

impl RunState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed | RunState::Cancelled)
    }

    /// Whether `next` is a valid successor of this state.
    pub fn can_advance_to(&self, next: &RunState) -> bool {
        match (self, next) {
            (RunState::Pending, RunState::Running { step: 0 }) => true,
            // An empty step table aggregates immediately.
            (RunState::Pending, RunState::Aggregating) => true,
            (RunState::Pending, RunState::Failed | RunState::Cancelled) => true,
            (RunState::Running { step: i }, RunState::Running { step: j }) => *j == i + 1,
            (RunState::Running { .. }, RunState::Aggregating) => true,
            (RunState::Running { .. }, RunState::Failed | RunState::Cancelled) => true,
            (RunState::Aggregating, RunState::Completed | RunState::Failed) => true,
            _ => false,
        }
    }

    /// The externally visible status for this state.
    pub fn status(&self) -> RunStatus {
        match self {
            RunState::Pending => RunStatus::Pending,
            RunState::Running { .. } | RunState::Aggregating => RunStatus::Running,
            RunState::Completed => RunStatus::Completed,
            RunState::Failed => RunStatus::Failed,
            RunState::Cancelled => RunStatus::Cancelled,
        }
    }
}

// ============================================================================
// Run Events
// ============================================================================

/// Execution-summary events emitted per run transition.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// The run moved from `Pending` to its first step
    RunStarted { document_id: String, steps: usize },
    /// A step began executing
    StepStarted { step_id: String, position: u32 },
    /// A step reached a terminal outcome
    StepFinished {
        step_id: String,
        status: StepStatus,
        attempts: u32,
        latency_ms: u64,
    },
    /// The per-document deadline was breached
    DeadlineExceeded { document_id: String, deadline_ms: u64 },
    /// Steps resolved; heuristics and aggregation running
    Aggregating {
        reasoning_findings: usize,
        heuristic_findings: usize,
    },
    /// The run reached a terminal status
    RunFinished {
        document_id: String,
        status: RunStatus,
    },
}

// ============================================================================
// Pipeline Run
// ============================================================================

/// Per-document execution state, owned exclusively by one orchestrator.
struct PipelineRun {
    state: RunState,
    context: AnalysisContext,
    findings: Vec<RiskFinding>,
    summaries: Vec<StepSummary>,
    succeeded_steps: Vec<String>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: RunState::Pending,
            context: AnalysisContext::new(),
            findings: Vec::new(),
            summaries: Vec::new(),
            succeeded_steps: Vec::new(),
        }
    }

    /// Advance the state machine, rejecting invalid transitions as defects.
    fn advance(&mut self, next: RunState) -> RunResult<()> {
        if !self.state.can_advance_to(&next) {
            return Err(RunError::invariant(format!(
                "invalid run transition {:?} -> {:?}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives one document through the step pipeline to a terminal report.
pub struct PipelineOrchestrator {
    document: Document,
    table: Arc<StepTable>,
    executor: StepExecutor,
    heuristics: Arc<HeuristicEngine>,
    aggregator: RiskAggregator,
    run_deadline: Duration,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator for one document.
    pub fn new(
        document: Document,
        table: Arc<StepTable>,
        client: Arc<dyn ReasoningClient>,
        heuristics: Arc<HeuristicEngine>,
        scoring: ScoringConfig,
        run_deadline: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let aggregator = RiskAggregator::new(scoring, &table);
        Self {
            document,
            table,
            executor: StepExecutor::new(client),
            heuristics,
            aggregator,
            run_deadline,
            cancel,
            events: None,
        }
    }

    /// Attach an event channel for execution-summary events.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Run the pipeline to a terminal report.
    ///
    /// Returns `Err` only for invariant violations; every runtime failure
    /// mode is folded into the report's status and verdict.
    pub async fn run(self) -> RunResult<AnalysisReport> {
        let mut run = PipelineRun::new();
        let deadline = Instant::now() + self.run_deadline;

        tracing::info!(
            document = %self.document.id,
            steps = self.table.len(),
            "analysis run starting"
        );
        self.emit(RunEvent::RunStarted {
            document_id: self.document.id.clone(),
            steps: self.table.len(),
        });

        if self.cancel.is_cancelled() {
            run.advance(RunState::Cancelled)?;
            return self.finish_cancelled(run);
        }

        let mut fatal = false;
        for (index, def) in self.table.steps().iter().enumerate() {
            run.advance(RunState::Running { step: index })?;
            self.emit(RunEvent::StepStarted {
                step_id: def.id.clone(),
                position: def.position,
            });

            // A step whose required inputs never materialized is recorded
            // as skipped without invoking the service.
            if let Some(missing) = def
                .consumes
                .iter()
                .find(|c| !run.succeeded_steps.iter().any(|s| s == *c))
            {
                tracing::info!(
                    step = %def.id,
                    missing = %missing,
                    "required input missing, skipping step"
                );
                let result = StepResult::skipped(&def.id, 0, 0, None);
                self.record(&mut run, result);
                continue;
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                run.advance(RunState::Failed)?;
                return self.finish_deadline(run);
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    // The in-flight reasoning call is dropped; a late answer
                    // is discarded with it.
                    run.advance(RunState::Cancelled)?;
                    return self.finish_cancelled(run);
                }
                outcome = tokio::time::timeout(
                    remaining,
                    self.executor.execute(def, &self.document, &run.context),
                ) => {
                    let Ok(step_result) = outcome else {
                        run.advance(RunState::Failed)?;
                        return self.finish_deadline(run);
                    };

                    match step_result.status {
                        StepStatus::Succeeded => {
                            run.context.record(
                                def.position,
                                def.id.clone(),
                                step_result.fragments.clone(),
                            );
                            self.record(&mut run, step_result);
                        }
                        StepStatus::Failed => match def.failure_mode {
                            FailureMode::Fatal => {
                                let cause = step_result
                                    .error
                                    .as_ref()
                                    .map(|e| e.to_string())
                                    .unwrap_or_default();
                                let run_error = if step_result.error.as_ref().is_some_and(|e| e.is_transient()) {
                                    RunError::exhausted(&def.id, cause)
                                } else {
                                    RunError::step_failed(&def.id, cause)
                                };
                                tracing::warn!(
                                    document = %self.document.id,
                                    error = %run_error,
                                    "fatal step failure, aborting run"
                                );
                                self.record(&mut run, step_result);
                                fatal = true;
                            }
                            FailureMode::Skippable => {
                                let skipped = StepResult::skipped(
                                    &def.id,
                                    step_result.attempts,
                                    step_result.latency_ms,
                                    step_result.error,
                                );
                                self.record(&mut run, skipped);
                            }
                        },
                        // The executor never emits Skipped itself.
                        StepStatus::Skipped => self.record(&mut run, step_result),
                    }
                }
            }

            if fatal {
                run.advance(RunState::Failed)?;
                break;
            }
        }

        if !fatal {
            run.advance(RunState::Aggregating)?;
        }
        self.finish_resolved(run, fatal)
    }

    /// Record a step's outcome into the run: summary always, findings when
    /// the step succeeded.
    fn record(&self, run: &mut PipelineRun, result: StepResult) {
        self.emit(RunEvent::StepFinished {
            step_id: result.step_id.clone(),
            status: result.status,
            attempts: result.attempts,
            latency_ms: result.latency_ms,
        });
        run.summaries.push(result.summary());
        if result.status == StepStatus::Succeeded {
            run.succeeded_steps.push(result.step_id.clone());
            run.findings.extend(result.findings);
        }
    }

    /// Terminal path for runs whose steps resolved (all ran, or a fatal
    /// failure stopped the loop): heuristics, aggregation, report.
    fn finish_resolved(&self, mut run: PipelineRun, fatal: bool) -> RunResult<AnalysisReport> {
        let heuristic_findings = self.heuristics.evaluate(&self.document, &run.context);
        self.emit(RunEvent::Aggregating {
            reasoning_findings: run.findings.len(),
            heuristic_findings: heuristic_findings.len(),
        });
        run.findings.extend(heuristic_findings);

        if !fatal {
            // Skipped steps degrade the verdict but still complete the run.
            run.advance(RunState::Completed)?;
        }

        let status = run.state.status();
        let degraded = fatal || !self.fully_succeeded(&run);
        let (findings, verdict) = self
            .aggregator
            .aggregate(std::mem::take(&mut run.findings), degraded);

        tracing::info!(
            document = %self.document.id,
            status = %status,
            findings = findings.len(),
            bucket = %verdict.bucket,
            degraded,
            "analysis run finished"
        );
        self.emit(RunEvent::RunFinished {
            document_id: self.document.id.clone(),
            status,
        });
        ReportBuilder::build(&self.document, status, findings, verdict, run.summaries)
    }

    /// Terminal path for cancellation: no heuristics, accumulated findings
    /// only, always degraded.
    fn finish_cancelled(&self, mut run: PipelineRun) -> RunResult<AnalysisReport> {
        tracing::info!(
            cause = %RunError::cancelled(&self.document.id),
            "analysis run cancelled"
        );
        let (findings, verdict) = self
            .aggregator
            .aggregate(std::mem::take(&mut run.findings), true);
        self.emit(RunEvent::RunFinished {
            document_id: self.document.id.clone(),
            status: RunStatus::Cancelled,
        });
        ReportBuilder::build(
            &self.document,
            RunStatus::Cancelled,
            findings,
            verdict,
            run.summaries,
        )
    }

    /// Terminal path for a breached per-document deadline.
    fn finish_deadline(&self, run: PipelineRun) -> RunResult<AnalysisReport> {
        let deadline_ms = self.run_deadline.as_millis() as u64;
        tracing::warn!(
            cause = %RunError::deadline(&self.document.id, deadline_ms),
            "run deadline exceeded"
        );
        self.emit(RunEvent::DeadlineExceeded {
            document_id: self.document.id.clone(),
            deadline_ms,
        });
        self.finish_resolved(run, true)
    }

    fn fully_succeeded(&self, run: &PipelineRun) -> bool {
        run.summaries.len() == self.table.len()
            && run
                .summaries
                .iter()
                .all(|s| s.status == StepStatus::Succeeded)
    }
}

// ============================================================================
// Tests
// ============================================================================
