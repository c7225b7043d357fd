//! Risk Aggregator
//!
//! Merges findings from all steps and the heuristic engine into one stable
//! ordered list and computes the overall verdict. Aggregation is
//! deterministic and order-independent with respect to finding identity:
//! the same finding set yields the same verdict no matter the arrival order.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use redline_core::{FindingOrigin, RiskFinding, RiskVerdict, Severity};

use crate::step::StepTable;

// ============================================================================
// Scoring Configuration
// ============================================================================

/// Verdict scoring policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Findings below this confidence do not set the overall bucket
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_confidence_threshold() -> f32 {
    0.5
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Aggregates findings into the ordered report list and the verdict.
pub struct RiskAggregator {
    scoring: ScoringConfig,
    /// Step position by id, for the primary ordering key
    positions: HashMap<String, u32>,
}

impl RiskAggregator {
    /// Create an aggregator for the given step table.
    pub fn new(scoring: ScoringConfig, table: &StepTable) -> Self {
        let positions = table
            .steps()
            .iter()
            .map(|s| (s.id.clone(), s.position))
            .collect();
        Self { scoring, positions }
    }

    /// Sort findings into stable report order and compute the verdict.
    ///
    /// Ordering: producing step position (heuristic findings last), then
    /// severity descending, then referenced segment position ascending.
    /// The numeric score is a monotonically non-decreasing function of each
    /// finding's (severity, confidence) pair; the bucket is the maximum
    /// severity among findings at or above the confidence threshold. A
    /// degraded verdict additionally never reports a bucket more favorable
    /// than the highest severity collected at any confidence.
    pub fn aggregate(
        &self,
        mut findings: Vec<RiskFinding>,
        degraded: bool,
    ) -> (Vec<RiskFinding>, RiskVerdict) {
        findings.sort_by_key(|f| {
            (
                self.origin_position(&f.origin),
                Reverse(f.severity),
                f.segment.as_ref().map(|s| s.position).unwrap_or(usize::MAX),
            )
        });

        if findings.is_empty() {
            return (findings, RiskVerdict::empty(degraded));
        }

        let score: f64 = findings
            .iter()
            .map(|f| f.severity.weight() * f64::from(f.confidence))
            .sum();

        let mut bucket = findings
            .iter()
            .filter(|f| f.confidence >= self.scoring.confidence_threshold)
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Info);

        if degraded {
            // Missing data never improves the verdict: a partial run's
            // bucket is floored at the highest severity collected so far,
            // threshold or not.
            let floor = findings
                .iter()
                .map(|f| f.severity)
                .max()
                .unwrap_or(Severity::Info);
            bucket = bucket.max(floor);
        }

        let mut contributing: Vec<usize> = findings
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.severity == bucket && f.confidence >= self.scoring.confidence_threshold
            })
            .map(|(i, _)| i)
            .collect();
        if contributing.is_empty() {
            contributing = findings
                .iter()
                .enumerate()
                .filter(|(_, f)| f.severity == bucket)
                .map(|(i, _)| i)
                .collect();
        }

        let verdict = RiskVerdict {
            bucket,
            score,
            contributing,
            degraded,
        };
        (findings, verdict)
    }

    fn origin_position(&self, origin: &FindingOrigin) -> u32 {
        match origin {
            FindingOrigin::Heuristic => u32::MAX,
            FindingOrigin::ReasoningStep { step_id } => self
                .positions
                .get(step_id)
                .copied()
                .unwrap_or(u32::MAX - 1),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
