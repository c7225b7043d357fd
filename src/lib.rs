//! Redline
//!
//! Document risk-analysis orchestration engine: takes a segmented document
//! and drives it through an ordered pipeline of reasoning steps (clause
//! extraction, ambiguity detection, obligation mapping, risk classification,
//! scoring), augments the results with deterministic heuristics, and emits a
//! structured `AnalysisReport` with an overall risk verdict.
//!
//! The engine tolerates partial failure without discarding completed work:
//! a document accepted by the scheduler always resolves to a well-formed
//! report, with `status` and `verdict.degraded` communicating how much of
//! the pipeline stands behind it.
//!
//! ## Workspace layout
//!
//! - `redline-core` - data model, error taxonomy, context accumulation
//! - `redline-reasoning` - the capability boundary to the external
//!   reasoning service (trait, typed errors, HTTP client, rate limiting,
//!   scripted test client)
//! - `redline-pipeline` - step registry, executor, orchestrator,
//!   heuristics, aggregation, report building
//! - `redline` (this crate) - engine configuration and the concurrent
//!   document scheduler
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use redline::{DocumentScheduler, EngineConfig};
//! use redline_core::{Document, Segment};
//! use redline_reasoning::{HttpClientConfig, HttpReasoningClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpReasoningClient::new(HttpClientConfig::new(
//!     "https://reasoning.internal/".parse()?,
//! ))?);
//! let scheduler = DocumentScheduler::new(EngineConfig::default(), client)?;
//!
//! let document = Document::new(
//!     "contract-42",
//!     vec![Segment::new("s1", "Either party may terminate at will.", 0)],
//! )?;
//! let handle = scheduler.submit(document)?;
//! let report = handle.report().await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod scheduler;

// ── Engine Surface ─────────────────────────────────────────────────────
pub use config::EngineConfig;
pub use scheduler::{AnalysisHandle, DocumentScheduler, SubmitError};

// ── Re-exported Workspace Types ────────────────────────────────────────
pub use redline_core::{
    AnalysisReport, Document, FindingOrigin, RiskCategory, RiskFinding, RiskVerdict, RunError,
    RunResult, RunStatus, Segment, SegmentRef, SegmentTag, Severity, StepStatus, StepSummary,
};
pub use redline_pipeline::{
    FailureMode, HeuristicConfig, RetryPolicy, RunEvent, ScoringConfig, StepDefinition, StepKind,
    StepTable,
};
pub use redline_reasoning::{
    ErrorClass, RateLimitConfig, RateLimiter, ReasoningClient, ReasoningError, ScriptedClient,
};
