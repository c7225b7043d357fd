//! Report Builder
//!
//! Pure assembly of the terminal `AnalysisReport`. The only failure is the
//! invariant check on the run status: building a report from a non-terminal
//! run is a programming defect, not a runtime condition.

use chrono::Utc;

use redline_core::{
    AnalysisReport, Document, RiskFinding, RiskVerdict, RunError, RunResult, RunStatus,
    StepSummary,
};

/// Assembles analysis reports.
pub struct ReportBuilder;

impl ReportBuilder {
    /// Build the terminal report for one run.
    pub fn build(
        document: &Document,
        status: RunStatus,
        findings: Vec<RiskFinding>,
        verdict: RiskVerdict,
        step_summaries: Vec<StepSummary>,
    ) -> RunResult<AnalysisReport> {
        if !status.is_terminal() {
            return Err(RunError::invariant(format!(
                "report requested for document {} while run is {}",
                document.id, status
            )));
        }

        Ok(AnalysisReport {
            document_id: document.id.clone(),
            status,
            findings,
            verdict,
            step_summaries,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use redline_core::Segment;

    fn document() -> Document {
        Document::new("doc-1", vec![Segment::new("s1", "text", 0)]).unwrap()
    }

    #[test]
    fn test_build_terminal_report() {
        let report = ReportBuilder::build(
            &document(),
            RunStatus::Completed,
            Vec::new(),
            RiskVerdict::empty(false),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(report.document_id, "doc-1");
        assert_eq!(report.status, RunStatus::Completed);
    }

    #[test]
    fn test_build_rejects_non_terminal_run() {
        for status in [RunStatus::Pending, RunStatus::Running] {
            let result = ReportBuilder::build(
                &document(),
                status,
                Vec::new(),
                RiskVerdict::empty(false),
                Vec::new(),
            );
            assert!(matches!(result, Err(RunError::InvariantViolation(_))));
        }
    }
}
