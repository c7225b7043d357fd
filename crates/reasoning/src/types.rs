//! Reasoning Request and Answer Types
//!
//! The typed request/response contract between the analysis pipeline and
//! the external reasoning service. The engine never depends on prompt
//! content or model identity; only on this contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use redline_core::Segment;

/// One invocation of the reasoning service on behalf of a pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningRequest {
    /// Step this request belongs to
    pub step_id: String,
    /// What the step asks the service to do. Opaque policy string; the
    /// engine never inspects it.
    pub directive: String,
    /// Document under analysis
    pub document_id: String,
    /// Segments the step operates over, in document order
    pub segments: Vec<Segment>,
    /// Accumulated context from prior steps, as a merged JSON object
    pub context: Value,
}

impl ReasoningRequest {
    /// Create a request for the given step over the given segments.
    pub fn new(
        step_id: impl Into<String>,
        directive: impl Into<String>,
        document_id: impl Into<String>,
        segments: Vec<Segment>,
        context: Value,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            directive: directive.into(),
            document_id: document_id.into(),
            segments,
            context,
        }
    }
}

/// Raw answer from the reasoning service.
///
/// The `content` payload is opaque at this boundary; turning it into typed
/// findings and context fragments is the step executor's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStepAnswer {
    /// Structured answer payload
    pub content: Value,
    /// Model that produced the answer, when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl RawStepAnswer {
    /// Wrap a content payload with no model attribution.
    pub fn new(content: Value) -> Self {
        Self {
            content,
            model: None,
        }
    }
}
