//! Accumulated Analysis Context
//!
//! Each pipeline step contributes context fragments that later steps (and
//! the heuristic engine) may consume. `AnalysisContext` is the union of all
//! prior steps' fragments, keyed by step position in an ordered map so that
//! iteration and the merged JSON view are deterministic.
//!
//! A step at position *i* only ever sees fragments recorded at positions
//! < *i*: the orchestrator records a step's fragments strictly after the
//! step resolves, and never hands a context forward out of order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One context fragment carried forward from a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFragment {
    /// Step that produced the fragment
    pub step_id: String,
    /// Fragment key, unique within the producing step
    pub key: String,
    /// Fragment payload
    pub value: Value,
}

impl ContextFragment {
    /// Create a fragment.
    pub fn new(step_id: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            step_id: step_id.into(),
            key: key.into(),
            value,
        }
    }
}

/// Fragments contributed by a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepContribution {
    step_id: String,
    fragments: Vec<ContextFragment>,
}

/// The accumulated context of one pipeline run.
///
/// Owned exclusively by one orchestrator instance; never shared across
/// documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Contributions keyed by step position
    contributions: BTreeMap<u32, StepContribution>,
}

impl AnalysisContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fragments produced by the step at `position`.
    ///
    /// Recording twice for the same position replaces the earlier entry;
    /// the orchestrator records each step at most once.
    pub fn record(&mut self, position: u32, step_id: impl Into<String>, fragments: Vec<ContextFragment>) {
        self.contributions.insert(
            position,
            StepContribution {
                step_id: step_id.into(),
                fragments,
            },
        );
    }

    /// All fragments in step-position order.
    pub fn fragments(&self) -> impl Iterator<Item = &ContextFragment> {
        self.contributions.values().flat_map(|c| c.fragments.iter())
    }

    /// Fragments contributed by steps at positions strictly below `position`.
    pub fn fragments_before(&self, position: u32) -> impl Iterator<Item = &ContextFragment> {
        self.contributions
            .range(..position)
            .flat_map(|(_, c)| c.fragments.iter())
    }

    /// Whether any step has contributed yet.
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Number of steps that have contributed.
    pub fn step_count(&self) -> usize {
        self.contributions.len()
    }

    /// Merge into a single JSON object: `{ step_id: { key: value } }`.
    ///
    /// This is the view handed to the reasoning service as the accumulated
    /// context for the next step.
    pub fn merged(&self) -> Value {
        let mut root = serde_json::Map::new();
        for contribution in self.contributions.values() {
            let mut step_obj = serde_json::Map::new();
            for fragment in &contribution.fragments {
                step_obj.insert(fragment.key.clone(), fragment.value.clone());
            }
            root.insert(contribution.step_id.clone(), Value::Object(step_obj));
        }
        Value::Object(root)
    }
}
