//! Engine Configuration
//!
//! One `EngineConfig` is loaded per engine and treated as immutable for its
//! lifetime: the step table, heuristic rules, and scoring policy it carries
//! are compiled/validated once at scheduler construction and never mutated
//! during execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use redline_pipeline::{HeuristicConfig, ScoringConfig, StepDefinition, StepTable};

/// Configuration for the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of documents analyzed concurrently
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Submissions held beyond the concurrent set before backpressure kicks in
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Overall per-document deadline
    #[serde(default = "default_run_deadline_ms")]
    pub run_deadline_ms: u64,
    /// Verdict scoring policy
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Heuristic rule set
    #[serde(default)]
    pub heuristics: HeuristicConfig,
    /// Pipeline step table; defaults to the standard five-step pipeline
    #[serde(default = "default_steps")]
    pub steps: Vec<StepDefinition>,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_queue_depth() -> usize {
    16
}

fn default_run_deadline_ms() -> u64 {
    120_000
}

fn default_steps() -> Vec<StepDefinition> {
    StepTable::standard().steps().to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_depth: default_queue_depth(),
            run_deadline_ms: default_run_deadline_ms(),
            scoring: ScoringConfig::default(),
            heuristics: HeuristicConfig::default(),
            steps: default_steps(),
        }
    }
}

impl EngineConfig {
    /// Per-document deadline as a `Duration`.
    pub fn run_deadline(&self) -> Duration {
        Duration::from_millis(self.run_deadline_ms)
    }
}
