//! Verdict and Report Types
//!
//! The terminal artifacts of one analysis run: the per-step execution
//! summaries, the aggregated `RiskVerdict`, and the `AnalysisReport` handed
//! to the API layer. All of these serialize to the camelCase JSON shape the
//! API layer expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::{RiskFinding, Severity};

/// Lifecycle status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted, not yet started
    Pending,
    /// Steps executing
    Running,
    /// All steps resolved and the report was built
    Completed,
    /// A fatal condition ended the run early
    Failed,
    /// Cancelled on external request
    Cancelled,
}

impl RunStatus {
    /// Whether this status is terminal. A run reaches a terminal status
    /// exactly once and never leaves it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step produced a usable result
    Succeeded,
    /// The step failed terminally
    Failed,
    /// The step failed but its policy let the run continue without it
    Skipped,
}

/// Execution summary for one step, carried on the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    /// Step identifier
    pub step_id: String,
    /// Terminal outcome
    pub status: StepStatus,
    /// Invocation attempts made (1-based; 0 for steps never reached)
    pub attempts: u32,
    /// Wall-clock latency across all attempts
    pub latency_ms: u64,
}

/// The aggregated overall risk assessment for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVerdict {
    /// Overall severity bucket
    pub bucket: Severity,
    /// Numeric score, secondary ranking signal
    pub score: f64,
    /// Indices into the report's finding list that drove the bucket
    pub contributing: Vec<usize>,
    /// True when produced from a partially failed pipeline
    pub degraded: bool,
}

impl RiskVerdict {
    /// The verdict of an empty finding set.
    pub fn empty(degraded: bool) -> Self {
        Self {
            bucket: Severity::Info,
            score: 0.0,
            contributing: Vec::new(),
            degraded,
        }
    }
}

/// Terminal artifact of one analysis run. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Analyzed document id
    pub document_id: String,
    /// Terminal run status
    pub status: RunStatus,
    /// Findings in stable aggregation order
    pub findings: Vec<RiskFinding>,
    /// Overall verdict
    pub verdict: RiskVerdict,
    /// Per-step execution summaries in pipeline order
    pub step_summaries: Vec<StepSummary>,
    /// Report generation time
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{FindingOrigin, RiskCategory};

    #[test]
    fn test_run_status_terminality() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_empty_verdict() {
        let verdict = RiskVerdict::empty(true);
        assert_eq!(verdict.bucket, Severity::Info);
        assert_eq!(verdict.score, 0.0);
        assert!(verdict.contributing.is_empty());
        assert!(verdict.degraded);
    }

    #[test]
    fn test_report_serialization_shape() {
        let finding = RiskFinding::new(
            RiskCategory::MissingClause,
            Severity::High,
            0.95,
            "no limitation of liability clause",
            FindingOrigin::Heuristic,
        );
        let report = AnalysisReport {
            document_id: "doc-1".to_string(),
            status: RunStatus::Completed,
            findings: vec![finding],
            verdict: RiskVerdict {
                bucket: Severity::High,
                score: 7.6,
                contributing: vec![0],
                degraded: false,
            },
            step_summaries: vec![StepSummary {
                step_id: "clause_extraction".to_string(),
                status: StepStatus::Succeeded,
                attempts: 1,
                latency_ms: 120,
            }],
            generated_at: Utc::now(),
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"documentId\":\"doc-1\""));
        assert!(json.contains("\"status\":\"completed\""));
        assert!(json.contains("\"verdict\""));
        assert!(json.contains("\"degraded\":false"));
        assert!(json.contains("\"stepSummaries\""));
        assert!(json.contains("\"latencyMs\":120"));
    }

    #[test]
    fn test_report_round_trip() {
        let report = AnalysisReport {
            document_id: "doc-2".to_string(),
            status: RunStatus::Failed,
            findings: Vec::new(),
            verdict: RiskVerdict::empty(true),
            step_summaries: Vec::new(),
            generated_at: Utc::now(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, RunStatus::Failed);
        assert!(parsed.verdict.degraded);
    }
}
