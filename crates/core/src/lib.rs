//! Redline Core
//!
//! Foundational data model, error types, and context accumulation for the
//! Redline risk-analysis workspace. This crate has zero dependencies on
//! runtime-level code (HTTP, async runtime, reasoning providers, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Run-level error types (`RunError`, `RunResult`)
//! - `document` - Immutable document and segment model
//! - `finding` - Risk findings, categories, and the ordered severity scale
//! - `context` - Accumulated per-run analysis context (`AnalysisContext`)
//! - `report` - Verdict, step summaries, and the terminal `AnalysisReport`
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror/chrono** - keeps build times minimal
//! 2. **Immutable artifacts** - documents, findings, and reports never mutate after creation
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod context;
pub mod document;
pub mod error;
pub mod finding;
pub mod report;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{RunError, RunResult};

// ── Document Model ─────────────────────────────────────────────────────
pub use document::{Document, Segment, SegmentRef, SegmentTag};

// ── Findings ───────────────────────────────────────────────────────────
pub use finding::{FindingOrigin, RiskCategory, RiskFinding, Severity};

// ── Analysis Context ───────────────────────────────────────────────────
pub use context::{AnalysisContext, ContextFragment};

// ── Verdict & Report ───────────────────────────────────────────────────
pub use report::{AnalysisReport, RiskVerdict, RunStatus, StepStatus, StepSummary};
