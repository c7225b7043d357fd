//! Document Scheduler
//!
//! Runs one `PipelineOrchestrator` per submitted document over a bounded
//! worker pool. Admission is two-layered: an atomic admitted counter bounds
//! total in-flight work at `max_concurrent + queue_depth` (excess
//! submissions are rejected with a retryable error), and a fair semaphore
//! grants the `max_concurrent` running slots in FIFO submission order.
//!
//! No mutable state crosses run boundaries: the only shared pieces are the
//! counter, the semaphore, and whatever rate-limit budget the reasoning
//! client enforces internally.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use redline_core::{AnalysisReport, Document, RunError, RunResult};
use redline_pipeline::{
    HeuristicEngine, PipelineOrchestrator, RunEvent, StepTable,
};
use redline_reasoning::ReasoningClient;

use crate::config::EngineConfig;

// ============================================================================
// Submission Errors
// ============================================================================

/// Errors returned at the submission boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The scheduler is at capacity; the caller may retry later
    #[error("analysis queue full ({capacity} submissions in flight), retry later")]
    QueueFull { capacity: usize },
}

impl SubmitError {
    /// Whether the caller may retry the submission.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::QueueFull { .. })
    }
}

// ============================================================================
// Analysis Handle
// ============================================================================

/// Handle to one submitted document's analysis.
#[derive(Debug)]
pub struct AnalysisHandle {
    id: Uuid,
    document_id: String,
    cancel: CancellationToken,
    report: oneshot::Receiver<RunResult<AnalysisReport>>,
}

impl AnalysisHandle {
    /// Unique id of this submission.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Id of the submitted document.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Request cancellation. The run stops at its next suspension point and
    /// resolves to a report with status `Cancelled`; an in-flight reasoning
    /// answer arriving afterwards is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the terminal report.
    ///
    /// Always yields a well-formed report for an accepted document;
    /// `Err` means the run hit a programming-defect invariant.
    pub async fn report(self) -> RunResult<AnalysisReport> {
        match self.report.await {
            Ok(result) => result,
            Err(_) => Err(RunError::invariant(format!(
                "analysis task for document {} dropped without reporting",
                self.document_id
            ))),
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Bounded-concurrency scheduler over per-document pipeline runs.
pub struct DocumentScheduler {
    config: EngineConfig,
    client: Arc<dyn ReasoningClient>,
    table: Arc<StepTable>,
    heuristics: Arc<HeuristicEngine>,
    running_slots: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    capacity: usize,
}

impl DocumentScheduler {
    /// Create a scheduler, validating the step table and compiling the
    /// heuristic rule set once.
    pub fn new(config: EngineConfig, client: Arc<dyn ReasoningClient>) -> RunResult<Self> {
        let table = Arc::new(StepTable::new(config.steps.clone())?);
        let heuristics = Arc::new(HeuristicEngine::new(config.heuristics.clone())?);
        let capacity = config.max_concurrent + config.queue_depth;
        tracing::info!(
            max_concurrent = config.max_concurrent,
            queue_depth = config.queue_depth,
            steps = table.len(),
            client = client.name(),
            "document scheduler ready"
        );
        Ok(Self {
            running_slots: Arc::new(Semaphore::new(config.max_concurrent)),
            admitted: Arc::new(AtomicUsize::new(0)),
            capacity,
            config,
            client,
            table,
            heuristics,
        })
    }

    /// Submit a document for analysis.
    pub fn submit(&self, document: Document) -> Result<AnalysisHandle, SubmitError> {
        self.spawn(document, None)
    }

    /// Submit a document and receive execution-summary events for its run.
    pub fn submit_with_events(
        &self,
        document: Document,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> Result<AnalysisHandle, SubmitError> {
        self.spawn(document, Some(events))
    }

    /// Cancel a submission through its handle.
    pub fn cancel(&self, handle: &AnalysisHandle) {
        handle.cancel();
    }

    /// Number of submissions currently queued or running.
    pub fn in_flight(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }

    fn spawn(
        &self,
        document: Document,
        events: Option<mpsc::UnboundedSender<RunEvent>>,
    ) -> Result<AnalysisHandle, SubmitError> {
        // Claim an admission slot, or reject retryably at capacity.
        let capacity = self.capacity;
        self.admitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |admitted| {
                (admitted < capacity).then_some(admitted + 1)
            })
            .map_err(|_| {
                tracing::warn!(document = %document.id, capacity, "submission rejected, queue full");
                SubmitError::QueueFull { capacity }
            })?;

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let handle = AnalysisHandle {
            id: Uuid::new_v4(),
            document_id: document.id.clone(),
            cancel: cancel.clone(),
            report: rx,
        };

        let mut orchestrator = PipelineOrchestrator::new(
            document,
            Arc::clone(&self.table),
            Arc::clone(&self.client),
            Arc::clone(&self.heuristics),
            self.config.scoring.clone(),
            self.config.run_deadline(),
            cancel.clone(),
        );
        if let Some(events) = events {
            orchestrator = orchestrator.with_events(events);
        }

        let running_slots = Arc::clone(&self.running_slots);
        let admitted = Arc::clone(&self.admitted);
        tokio::spawn(async move {
            // Wait for a running slot in FIFO order, unless cancelled while
            // queued; a cancelled run resolves immediately inside run().
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = running_slots.acquire_owned() => permit.ok(),
            };

            let result = orchestrator.run().await;
            admitted.fetch_sub(1, Ordering::SeqCst);
            // The caller may have dropped the handle; the run still counts.
            let _ = tx.send(result);
        });

        Ok(handle)
    }
}

// ============================================================================
// Tests
// ============================================================================
