//! Run Error Types
//!
//! Defines the run-level error taxonomy shared across the Redline workspace.
//! These error types are dependency-free (only thiserror + std) to keep the
//! core crate lightweight.
//!
//! Reasoning-service errors (transient/permanent classification) live in the
//! `redline-reasoning` crate; this module covers the conditions that belong
//! to a pipeline run itself.

use thiserror::Error;

/// Run-level error type for the Redline workspace.
///
/// Most of these are folded into a terminal `AnalysisReport` rather than
/// propagated: a run that was accepted always produces a report. The one
/// exception is `InvariantViolation`, which marks a programming defect and
/// is surfaced to the caller as an `Err`.
#[derive(Error, Debug)]
pub enum RunError {
    /// A step used up its retry budget
    #[error("step {step_id} exhausted its retry budget: {cause}")]
    StepPolicyExhausted { step_id: String, cause: String },

    /// A step failed on a non-retryable error
    #[error("step {step_id} failed: {cause}")]
    StepFailed { step_id: String, cause: String },

    /// The per-document deadline was breached
    #[error("run deadline of {deadline_ms}ms exceeded for document {document_id}")]
    RunTimeoutExceeded {
        document_id: String,
        deadline_ms: u64,
    },

    /// The run was cancelled externally
    #[error("run cancelled for document {document_id}")]
    RunCancelled { document_id: String },

    /// Programming-error class; never expected in correct operation
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias for run errors
pub type RunResult<T> = Result<T, RunError>;

impl RunError {
    /// Create a step-exhausted error
    pub fn exhausted(step_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::StepPolicyExhausted {
            step_id: step_id.into(),
            cause: cause.into(),
        }
    }

    /// Create a step-failed error
    pub fn step_failed(step_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::StepFailed {
            step_id: step_id.into(),
            cause: cause.into(),
        }
    }

    /// Create a deadline-exceeded error
    pub fn deadline(document_id: impl Into<String>, deadline_ms: u64) -> Self {
        Self::RunTimeoutExceeded {
            document_id: document_id.into(),
            deadline_ms,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(document_id: impl Into<String>) -> Self {
        Self::RunCancelled {
            document_id: document_id.into(),
        }
    }

    /// Create an invariant-violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Whether this error terminates the whole run rather than one step.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            RunError::RunTimeoutExceeded { .. } | RunError::RunCancelled { .. }
        )
    }
}

/// Convert RunError to a string
impl From<RunError> for String {
    fn from(err: RunError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunError::exhausted("clause_extraction", "rate limited");
        assert_eq!(
            err.to_string(),
            "step clause_extraction exhausted its retry budget: rate limited"
        );
    }

    #[test]
    fn test_deadline_display() {
        let err = RunError::deadline("doc-1", 5000);
        assert!(err.to_string().contains("5000ms"));
        assert!(err.to_string().contains("doc-1"));
    }

    #[test]
    fn test_run_fatal_classification() {
        assert!(RunError::deadline("doc-1", 100).is_run_fatal());
        assert!(RunError::cancelled("doc-1").is_run_fatal());
        assert!(!RunError::step_failed("s", "boom").is_run_fatal());
        assert!(!RunError::invariant("bad state").is_run_fatal());
    }

    #[test]
    fn test_error_conversion() {
        let err = RunError::invariant("report built from non-terminal run");
        let msg: String = err.into();
        assert!(msg.contains("invariant violation"));
    }
}
