//! Risk Findings
//!
//! A `RiskFinding` is a single detected risk item: category, ordered
//! severity, confidence, the segment it points at, and where it came from.
//! Findings are immutable once created; a correction is modeled as a new
//! finding whose origin names the correcting step.

use serde::{Deserialize, Serialize};

use crate::document::SegmentRef;

/// Enumerated risk categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Wording open to more than one reading
    Ambiguity,
    /// An obligation not surfaced by the document structure
    HiddenObligation,
    /// A term materially favoring the counterparty
    UnfavorableTerm,
    /// An expected clause type is absent
    MissingClause,
    /// Uncapped or broad liability exposure
    LiabilityExposure,
    /// A regulatory or policy compliance gap
    ComplianceGap,
}

/// Ordered severity scale. Derived `Ord` follows declaration order,
/// so `Info < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric weight used by verdict scoring.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Info => 1.0,
            Severity::Low => 2.0,
            Severity::Medium => 4.0,
            Severity::High => 8.0,
            Severity::Critical => 16.0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingOrigin {
    /// Produced by the deterministic heuristic engine
    Heuristic,
    /// Produced by the named reasoning step
    ReasoningStep { step_id: String },
}

impl FindingOrigin {
    /// Origin for a reasoning step.
    pub fn step(step_id: impl Into<String>) -> Self {
        Self::ReasoningStep {
            step_id: step_id.into(),
        }
    }
}

impl std::fmt::Display for FindingOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingOrigin::Heuristic => write!(f, "heuristic"),
            FindingOrigin::ReasoningStep { step_id } => write!(f, "reasoning_step:{}", step_id),
        }
    }
}

/// A single detected risk item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFinding {
    /// Risk category
    pub category: RiskCategory,
    /// Ordered severity
    pub severity: Severity,
    /// Confidence in [0.0, 1.0]
    pub confidence: f32,
    /// Segment the finding points at, if segment-scoped
    #[serde(rename = "segmentRef", skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentRef>,
    /// Human-readable description
    pub description: String,
    /// Producer of the finding
    pub origin: FindingOrigin,
}

impl RiskFinding {
    /// Create a finding; confidence is clamped into [0.0, 1.0].
    pub fn new(
        category: RiskCategory,
        severity: Severity,
        confidence: f32,
        description: impl Into<String>,
        origin: FindingOrigin,
    ) -> Self {
        Self {
            category,
            severity,
            confidence: confidence.clamp(0.0, 1.0),
            segment: None,
            description: description.into(),
            origin,
        }
    }

    /// Attach the segment reference.
    pub fn at(mut self, segment: SegmentRef) -> Self {
        self.segment = Some(segment);
        self
    }
}
