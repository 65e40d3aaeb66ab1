//! Verdict payload types.
//!
//! The verdict is the engine's externally visible output. Sub-reports a
//! collaborator failed to produce are omitted and listed in `unavailable`
//! with their failure kind; the verdict itself always carries `success`
//! and, on any degradation, a human-readable summary.

use serde::Serialize;

use codejudge_ast::{IrAssessment, ScoreBreakdown, SimilarityDetails, SimilarityLevel};

use crate::exec::ExecResult;
use crate::logic::LogicReport;
use crate::providers::judge::Judgment;

/// A sub-report that could not be produced, with the failure kind.
#[derive(Debug, Clone, Serialize)]
pub struct UnavailableSection {
    pub section: String,
    pub kind: String,
    pub detail: String,
}

/// Execution section, present when the run-and-diff step was requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ExecResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<ExecResult>,
    /// Whether both runs produced identical stdout; absent when a run
    /// failed or timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs_match: Option<bool>,
    /// Distinguished timeout marker.
    pub timed_out: bool,
}

/// The orchestrator's fused output.
///
/// The logic decision is authoritative; the syntactic scores are
/// informational.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Verdict {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Overall syntactic similarity after adjustment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_similarity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_level: Option<SimilarityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SimilarityDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic: Option<LogicReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir: Option<IrAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Judgment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionSection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailableSection>,
}
