//! Heuristic Risk Engine
//!
//! Deterministic, pattern-based rule evaluation that augments the reasoning
//! steps' findings without calling any external service. Two rule families:
//! required-clause rules flag the absence of an expected clause type, and
//! term rules flag segments matching a configured pattern. Evaluation is a
//! pure function of the document, the accumulated context, and the compiled
//! rule set; findings always carry origin `Heuristic`.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use redline_core::{
    AnalysisContext, Document, FindingOrigin, RiskCategory, RiskFinding, RunError, RunResult,
    SegmentRef, Severity,
};

// ============================================================================
// Rule Configuration
// ============================================================================

/// A clause type the document is expected to contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredClauseRule {
    /// Clause identifier, matched against extraction fragments
    pub clause: String,
    /// Patterns that mark the clause as present in segment text
    pub patterns: Vec<String>,
    /// Severity of the absence finding
    pub severity: Severity,
    /// Confidence of the absence finding
    pub confidence: f32,
    /// Description attached to the absence finding
    pub description: String,
}

/// A pattern that marks a segment as risky wherever it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRule {
    /// Rule identifier, for logs
    pub name: String,
    /// Pattern matched against segment text, case-insensitive
    pub pattern: String,
    /// Category of the resulting finding
    pub category: RiskCategory,
    /// Severity of the resulting finding
    pub severity: Severity,
    /// Confidence of the resulting finding
    pub confidence: f32,
    /// Description attached to the resulting finding
    pub description: String,
}

/// Heuristic rule configuration, loaded once per engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicConfig {
    /// Clause types whose absence is a finding
    #[serde(default)]
    pub required_clauses: Vec<RequiredClauseRule>,
    /// Term patterns evaluated against every segment
    #[serde(default)]
    pub term_rules: Vec<TermRule>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl HeuristicConfig {
    /// An empty rule set: heuristic evaluation produces no findings.
    pub fn none() -> Self {
        Self {
            required_clauses: Vec::new(),
            term_rules: Vec::new(),
        }
    }

    /// The default contract-review rule set.
    pub fn standard() -> Self {
        Self {
            required_clauses: vec![
                RequiredClauseRule {
                    clause: "limitation_of_liability".to_string(),
                    patterns: vec![
                        "limitation of liability".to_string(),
                        r"liability\s+(is\s+)?(capped|limited)".to_string(),
                    ],
                    severity: Severity::High,
                    confidence: 0.8,
                    description: "no limitation of liability clause found".to_string(),
                },
                RequiredClauseRule {
                    clause: "governing_law".to_string(),
                    patterns: vec![
                        "governing law".to_string(),
                        "governed by the laws".to_string(),
                    ],
                    severity: Severity::Medium,
                    confidence: 0.8,
                    description: "no governing law clause found".to_string(),
                },
                RequiredClauseRule {
                    clause: "termination".to_string(),
                    patterns: vec!["terminat".to_string()],
                    severity: Severity::Medium,
                    confidence: 0.7,
                    description: "no termination clause found".to_string(),
                },
            ],
            term_rules: vec![
                TermRule {
                    name: "sole_discretion".to_string(),
                    pattern: "sole discretion".to_string(),
                    category: RiskCategory::UnfavorableTerm,
                    severity: Severity::Medium,
                    confidence: 0.7,
                    description: "unilateral discretion granted to one party".to_string(),
                },
                TermRule {
                    name: "unlimited_liability".to_string(),
                    pattern: r"unlimited\s+liability".to_string(),
                    category: RiskCategory::LiabilityExposure,
                    severity: Severity::High,
                    confidence: 0.8,
                    description: "liability is stated to be unlimited".to_string(),
                },
                TermRule {
                    name: "auto_renewal".to_string(),
                    pattern: r"automatic(ally)?\s+renew".to_string(),
                    category: RiskCategory::HiddenObligation,
                    severity: Severity::Medium,
                    confidence: 0.6,
                    description: "agreement renews automatically".to_string(),
                },
            ],
        }
    }
}

// ============================================================================
// Compiled Engine
// ============================================================================

struct CompiledClauseRule {
    rule: RequiredClauseRule,
    patterns: Vec<Regex>,
}

struct CompiledTermRule {
    rule: TermRule,
    pattern: Regex,
}

/// The heuristic engine with its rule set compiled once.
pub struct HeuristicEngine {
    clause_rules: Vec<CompiledClauseRule>,
    term_rules: Vec<CompiledTermRule>,
}

fn compile(pattern: &str) -> RunResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| RunError::invariant(format!("bad heuristic pattern {:?}: {}", pattern, e)))
}

impl HeuristicEngine {
    /// Compile the rule set. A malformed pattern is a configuration defect.
    pub fn new(config: HeuristicConfig) -> RunResult<Self> {
        let mut clause_rules = Vec::with_capacity(config.required_clauses.len());
        for rule in config.required_clauses {
            let patterns = rule
                .patterns
                .iter()
                .map(|p| compile(p))
                .collect::<RunResult<Vec<_>>>()?;
            clause_rules.push(CompiledClauseRule { rule, patterns });
        }

        let mut term_rules = Vec::with_capacity(config.term_rules.len());
        for rule in config.term_rules {
            let pattern = compile(&rule.pattern)?;
            term_rules.push(CompiledTermRule { rule, pattern });
        }

        Ok(Self {
            clause_rules,
            term_rules,
        })
    }

    /// Evaluate all rules over the document and accumulated context.
    ///
    /// Runs after the reasoning steps resolve (or after a pipeline failure,
    /// over whatever context was accumulated). Rule and segment order is
    /// fixed, so the output order is deterministic.
    pub fn evaluate(&self, document: &Document, context: &AnalysisContext) -> Vec<RiskFinding> {
        let mut findings = Vec::new();

        let extracted = extracted_clauses(context);
        for compiled in &self.clause_rules {
            if extracted.iter().any(|c| c == &compiled.rule.clause) {
                continue;
            }
            let in_text = document.segments.iter().any(|segment| {
                compiled
                    .patterns
                    .iter()
                    .any(|pattern| pattern.is_match(&segment.text))
            });
            if !in_text {
                tracing::debug!(clause = %compiled.rule.clause, "required clause missing");
                findings.push(RiskFinding::new(
                    RiskCategory::MissingClause,
                    compiled.rule.severity,
                    compiled.rule.confidence,
                    compiled.rule.description.clone(),
                    FindingOrigin::Heuristic,
                ));
            }
        }

        for segment in &document.segments {
            for compiled in &self.term_rules {
                if compiled.pattern.is_match(&segment.text) {
                    findings.push(
                        RiskFinding::new(
                            compiled.rule.category,
                            compiled.rule.severity,
                            compiled.rule.confidence,
                            compiled.rule.description.clone(),
                            FindingOrigin::Heuristic,
                        )
                        .at(SegmentRef::to(segment)),
                    );
                }
            }
        }

        findings
    }
}

/// Clause ids reported by extraction steps, from any fragment keyed
/// `clauses` whose value is an array of strings.
fn extracted_clauses(context: &AnalysisContext) -> Vec<String> {
    context
        .fragments()
        .filter(|f| f.key == "clauses")
        .filter_map(|f| f.value.as_array())
        .flatten()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
