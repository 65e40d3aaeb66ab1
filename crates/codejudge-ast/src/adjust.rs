//! Stylistic-difference detection and score adjustment.
//!
//! Two programs that implement the same algorithm often differ only in
//! style -- most commonly one names intermediate results while the other
//! inlines the expression. When control flow and declared functions agree
//! and the bundles show that kind of stylistic gap, the pair is declared
//! semantically equivalent and both the syntactic score and the
//! instruction-count score are boosted.

use serde::{Deserialize, Serialize};

use crate::compare::SimilarityLevel;
use crate::features::ParseFeatures;

/// Node kinds that signal declared intermediates across the supported
/// grammars.
const DECLARATION_KINDS: &[&str] = &[
    "declaration",
    "init_declarator",
    "variable_declaration",
    "lexical_declaration",
    "local_variable_declaration",
];

/// True when the bundle shows named intermediate results: assignments to
/// declared variables, or any declaration-kind node in the tree.
pub fn has_intermediate_variables(features: &ParseFeatures) -> bool {
    if features.operations.assignment > 0 && !features.variable_declarations.is_empty() {
        return true;
    }
    DECLARATION_KINDS
        .iter()
        .any(|kind| features.node_types.get(*kind).copied().unwrap_or(0) > 0)
}

/// Outcome of the stylistic analysis of a reference/candidate pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EquivalenceAnalysis {
    pub semantically_equivalent: bool,
    /// Score boost accumulated by the analysis; zero when not equivalent.
    pub adjustment: u32,
}

/// Decides semantic equivalence (in the narrow, stylistic sense).
///
/// Requires control-flow counters and the declared function multiset to
/// match, plus a stylistic-variation signal: the intermediate-variable
/// flags differ, or the node-count gap ratio sits in the 10-30% band that
/// named intermediates typically produce.
pub fn analyze_equivalence(
    reference: &ParseFeatures,
    candidate: &ParseFeatures,
    boost: u32,
) -> EquivalenceAnalysis {
    let control_flow_match = reference.control_flow == candidate.control_flow;

    let mut reference_names = reference.functions.clone();
    let mut candidate_names = candidate.functions.clone();
    reference_names.sort();
    candidate_names.sort();
    let functions_match = reference_names == candidate_names;

    let flags_differ =
        has_intermediate_variables(reference) != has_intermediate_variables(candidate);

    let max_nodes = reference.total_nodes.max(candidate.total_nodes);
    let ratio = if max_nodes == 0 {
        0.0
    } else {
        f64::from(reference.total_nodes.abs_diff(candidate.total_nodes)) / f64::from(max_nodes)
    };
    let stylistic_gap = flags_differ || (0.1..=0.3).contains(&ratio);

    if control_flow_match && functions_match && stylistic_gap {
        EquivalenceAnalysis {
            semantically_equivalent: true,
            adjustment: boost,
        }
    } else {
        EquivalenceAnalysis::default()
    }
}

/// Applies the accumulated adjustment to a syntactic overall score and
/// re-derives the level. Never exceeds 100.
pub fn adjust_syntactic(overall: u32, analysis: &EquivalenceAnalysis) -> (u32, SimilarityLevel) {
    let adjusted = (overall + analysis.adjustment).min(100);
    (adjusted, SimilarityLevel::from_score(adjusted))
}

/// Categorical label over the adjusted instruction-count similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyRating {
    Optimal,
    VerySimilar,
    Good,
    Acceptable,
    Inefficient,
}

impl EfficiencyRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            95..=u32::MAX => EfficiencyRating::Optimal,
            85..=94 => EfficiencyRating::VerySimilar,
            70..=84 => EfficiencyRating::Good,
            50..=69 => EfficiencyRating::Acceptable,
            _ => EfficiencyRating::Inefficient,
        }
    }
}

/// The instruction-count verdict after adjustment.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IrAssessment {
    pub count_a: usize,
    pub count_b: usize,
    pub adjusted_similarity: u32,
    pub efficiency_rating: EfficiencyRating,
}

/// Scores the instruction-count gap and applies the equivalence boosts.
///
/// The base score is count closeness, `(max - |gap|) / max`. A semantically
/// equivalent pair whose counts differ by at most `minor_diff_margin` is
/// raised to at least `minor_diff_floor`; the accumulated adjustment is
/// then added and the result clamped at 100.
pub fn assess_instruction_counts(
    count_a: usize,
    count_b: usize,
    analysis: &EquivalenceAnalysis,
    minor_diff_floor: u32,
    minor_diff_margin: usize,
) -> IrAssessment {
    let max = count_a.max(count_b);
    let gap = count_a.abs_diff(count_b);
    let base = if max == 0 {
        100.0
    } else {
        (max - gap) as f64 / max as f64 * 100.0
    };

    let mut adjusted = base.round() as u32;
    if analysis.semantically_equivalent && gap <= minor_diff_margin {
        adjusted = adjusted.max(minor_diff_floor);
    }
    adjusted = (adjusted + analysis.adjustment).min(100);

    IrAssessment {
        count_a,
        count_b,
        adjusted_similarity: adjusted,
        efficiency_rating: EfficiencyRating::from_score(adjusted),
    }
}
