//! Redline Pipeline
//!
//! The analysis pipeline proper: the enumerated step registry and policy
//! table, the retrying step executor, the per-document orchestrator state
//! machine, the deterministic heuristic rule engine, the risk aggregator,
//! and the report builder.
//!
//! Everything here operates on one document at a time. Concurrency across
//! documents is the scheduler's concern, one crate up.

pub mod aggregate;
pub mod executor;
pub mod heuristics;
pub mod orchestrator;
pub mod report;
pub mod step;

// Re-export main types
pub use aggregate::{RiskAggregator, ScoringConfig};
pub use executor::{parse_answer, ParsedAnswer, StepExecutor};
pub use heuristics::{HeuristicConfig, HeuristicEngine, RequiredClauseRule, TermRule};
pub use orchestrator::{PipelineOrchestrator, RunEvent, RunState};
pub use report::ReportBuilder;
pub use step::{FailureMode, RetryPolicy, StepDefinition, StepKind, StepResult, StepTable};
