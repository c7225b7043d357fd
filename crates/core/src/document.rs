//! Document and Segment Types
//!
//! A `Document` is the unit of analysis: an identifier plus the ordered
//! sequence of text segments produced by upstream preprocessing. Both are
//! immutable once accepted by the engine; the orchestrator never re-segments
//! or normalizes text itself.

use serde::{Deserialize, Serialize};

use crate::error::{RunError, RunResult};

/// Structural class of a segment, as tagged by upstream layout analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentTag {
    /// A contractual clause body
    Clause,
    /// A section or document header
    Header,
    /// Preamble / recital text
    Recital,
    /// A defined-terms entry
    Definition,
    /// Signature block
    Signature,
    /// Tabular content flattened to text
    Table,
    /// Any other structural class reported upstream
    Other(String),
}

/// One unit of document text (typically a clause or paragraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Segment identifier, unique within the document
    pub id: String,
    /// Normalized text content
    pub text: String,
    /// Zero-based position within the document
    pub position: usize,
    /// Optional structural tag from layout analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<SegmentTag>,
    /// Confidence reported by the upstream OCR/vision model, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_confidence: Option<f32>,
}

impl Segment {
    /// Create a segment with just an id, text, and position.
    pub fn new(id: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            position,
            tag: None,
            source_confidence: None,
        }
    }

    /// Set the structural tag.
    pub fn with_tag(mut self, tag: SegmentTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Set the upstream source confidence.
    pub fn with_source_confidence(mut self, confidence: f32) -> Self {
        self.source_confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// Lightweight reference to a segment, carried by findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    /// Referenced segment id
    pub segment_id: String,
    /// Position of the referenced segment
    pub position: usize,
}

impl SegmentRef {
    /// Build a reference to the given segment.
    pub fn to(segment: &Segment) -> Self {
        Self {
            segment_id: segment.id.clone(),
            position: segment.position,
        }
    }
}

/// A segmented document, immutable once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document identifier
    pub id: String,
    /// Segments in document order
    pub segments: Vec<Segment>,
}

impl Document {
    /// Create a document, validating that segment positions are strictly
    /// increasing and segment ids are unique.
    pub fn new(id: impl Into<String>, segments: Vec<Segment>) -> RunResult<Self> {
        let id = id.into();
        let mut last_position: Option<usize> = None;
        for segment in &segments {
            if let Some(prev) = last_position {
                if segment.position <= prev {
                    return Err(RunError::invariant(format!(
                        "document {}: segment {} position {} not strictly increasing",
                        id, segment.id, segment.position
                    )));
                }
            }
            last_position = Some(segment.position);
        }
        let mut ids: Vec<&str> = segments.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != segments.len() {
            return Err(RunError::invariant(format!(
                "document {}: duplicate segment ids",
                id
            )));
        }
        Ok(Self { id, segments })
    }

    /// Look up a segment by id.
    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the document has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
