//! Syntactic similarity scoring between two feature bundles.
//!
//! Five sub-scores, each in [0, 100], combined into a weighted overall
//! score and a categorical level. Every sub-score is symmetric in its
//! arguments and a bundle always scores 100 against itself.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::features::ParseFeatures;

/// Per-axis weights for the overall score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub structural: f64,
    pub control_flow: f64,
    pub operations: f64,
    pub node_types: f64,
    pub functions: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            structural: 0.30,
            control_flow: 0.20,
            operations: 0.20,
            node_types: 0.20,
            functions: 0.10,
        }
    }
}

/// Categorical similarity bands over the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimilarityLevel {
    VeryDifferent,
    Different,
    SomewhatSimilar,
    Similar,
    VerySimilar,
    Identical,
}

impl SimilarityLevel {
    /// Total over [0, 100]: every score maps to exactly one band.
    pub fn from_score(score: u32) -> Self {
        match score {
            95..=u32::MAX => SimilarityLevel::Identical,
            80..=94 => SimilarityLevel::VerySimilar,
            60..=79 => SimilarityLevel::Similar,
            40..=59 => SimilarityLevel::SomewhatSimilar,
            20..=39 => SimilarityLevel::Different,
            _ => SimilarityLevel::VeryDifferent,
        }
    }
}

/// Rounded per-axis scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structural: u32,
    pub control_flow: u32,
    pub operations: u32,
    pub node_types: u32,
    pub functions: u32,
}

/// Raw feature summaries of both programs, echoed into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityDetails {
    pub program_a: ParseFeatures,
    pub program_b: ParseFeatures,
}

/// The comparator's output.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityReport {
    pub overall: u32,
    pub level: SimilarityLevel,
    pub breakdown: ScoreBreakdown,
    pub details: SimilarityDetails,
}

/// Scores two feature bundles.
pub fn compare_features(a: &ParseFeatures, b: &ParseFeatures, weights: &Weights) -> SimilarityReport {
    let structural = structural_score(a, b);
    let control_flow = overlap_score(&a.control_flow.as_pairs(), &b.control_flow.as_pairs());
    let operations = overlap_score(&a.operations.as_pairs(), &b.operations.as_pairs());
    let node_types = node_type_score(a, b);
    let functions = function_score(a, b);

    let overall = (structural * weights.structural
        + control_flow * weights.control_flow
        + operations * weights.operations
        + node_types * weights.node_types
        + functions * weights.functions)
        .round() as u32;

    SimilarityReport {
        overall,
        level: SimilarityLevel::from_score(overall),
        breakdown: ScoreBreakdown {
            structural: structural.round() as u32,
            control_flow: control_flow.round() as u32,
            operations: operations.round() as u32,
            node_types: node_types.round() as u32,
            functions: functions.round() as u32,
        },
        details: SimilarityDetails {
            program_a: a.clone(),
            program_b: b.clone(),
        },
    }
}

/// Mean of a depth closeness score and a node-count closeness score.
fn structural_score(a: &ParseFeatures, b: &ParseFeatures) -> f64 {
    let depth_gap = (f64::from(a.depth) - f64::from(b.depth)).abs();
    let depth_score = (100.0 - depth_gap * 10.0).max(0.0);

    let max_nodes = a.total_nodes.max(b.total_nodes);
    let node_score = if max_nodes == 0 {
        100.0
    } else {
        let gap = (f64::from(a.total_nodes) - f64::from(b.total_nodes)).abs();
        (f64::from(max_nodes) - gap) / f64::from(max_nodes) * 100.0
    };

    (depth_score + node_score) / 2.0
}

/// `(Σ max − Σ |a−b|) / Σ max`, over a shared fixed key set.
fn overlap_score(a: &[(&str, u32)], b: &[(&str, u32)]) -> f64 {
    let mut sum_max = 0u32;
    let mut sum_diff = 0u32;
    for ((_, left), (_, right)) in a.iter().zip(b.iter()) {
        sum_max += (*left).max(*right);
        sum_diff += left.abs_diff(*right);
    }
    if sum_max == 0 {
        100.0
    } else {
        ((f64::from(sum_max) - f64::from(sum_diff)) / f64::from(sum_max) * 100.0).max(0.0)
    }
}

/// `Σ min / Σ max` over the union of node kinds.
fn node_type_score(a: &ParseFeatures, b: &ParseFeatures) -> f64 {
    let mut sum_min = 0u32;
    let mut sum_max = 0u32;
    let keys: BTreeSet<&str> = a
        .node_types
        .keys()
        .chain(b.node_types.keys())
        .map(String::as_str)
        .collect();
    for key in keys {
        let left = a.node_types.get(key).copied().unwrap_or(0);
        let right = b.node_types.get(key).copied().unwrap_or(0);
        sum_min += left.min(right);
        sum_max += left.max(right);
    }
    if sum_max == 0 {
        100.0
    } else {
        f64::from(sum_min) / f64::from(sum_max) * 100.0
    }
}

/// Jaccard similarity of the declared function name sets.
fn function_score(a: &ParseFeatures, b: &ParseFeatures) -> f64 {
    let left: BTreeSet<&str> = a.functions.iter().map(String::as_str).collect();
    let right: BTreeSet<&str> = b.functions.iter().map(String::as_str).collect();
    let union = left.union(&right).count();
    if union == 0 {
        100.0
    } else {
        let intersection = left.intersection(&right).count();
        intersection as f64 / union as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(total_nodes: u32, depth: u32, functions: &[&str]) -> ParseFeatures {
        ParseFeatures {
            total_nodes,
            depth,
            functions: functions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_bundles_score_100() {
        let mut a = features(25, 5, &["add"]);
        a.node_types.insert("identifier".to_string(), 4);
        a.control_flow.if_statements = 2;
        a.operations.arithmetic = 1;
        let report = compare_features(&a, &a.clone(), &Weights::default());
        assert_eq!(report.overall, 100);
        assert_eq!(report.level, SimilarityLevel::Identical);
        assert_eq!(report.breakdown.structural, 100);
        assert_eq!(report.breakdown.functions, 100);
    }

    #[test]
    fn empty_bundles_score_100() {
        let report = compare_features(
            &ParseFeatures::default(),
            &ParseFeatures::default(),
            &Weights::default(),
        );
        assert_eq!(report.overall, 100);
        assert_eq!(report.level, SimilarityLevel::Identical);
    }

    #[test]
    fn sub_scores_are_symmetric() {
        let mut a = features(30, 6, &["f", "g"]);
        a.node_types.insert("identifier".to_string(), 7);
        a.operations.arithmetic = 3;
        let mut b = features(18, 4, &["f"]);
        b.node_types.insert("identifier".to_string(), 3);
        b.node_types.insert("number_literal".to_string(), 2);
        b.control_flow.for_loops = 1;

        let ab = compare_features(&a, &b, &Weights::default());
        let ba = compare_features(&b, &a, &Weights::default());
        assert_eq!(ab.overall, ba.overall);
        assert_eq!(ab.breakdown.structural, ba.breakdown.structural);
        assert_eq!(ab.breakdown.control_flow, ba.breakdown.control_flow);
        assert_eq!(ab.breakdown.operations, ba.breakdown.operations);
        assert_eq!(ab.breakdown.node_types, ba.breakdown.node_types);
        assert_eq!(ab.breakdown.functions, ba.breakdown.functions);
    }

    #[test]
    fn depth_gap_penalizes_ten_per_level() {
        let a = features(10, 2, &[]);
        let b = features(10, 5, &[]);
        let report = compare_features(&a, &b, &Weights::default());
        // depth score 70, node score 100 -> structural 85
        assert_eq!(report.breakdown.structural, 85);
    }

    #[test]
    fn depth_score_clamps_at_zero() {
        let a = features(10, 0, &[]);
        let b = features(10, 30, &[]);
        let report = compare_features(&a, &b, &Weights::default());
        // depth score clamps to 0, node score 100 -> structural 50
        assert_eq!(report.breakdown.structural, 50);
    }

    #[test]
    fn disjoint_function_names_score_zero() {
        let a = features(10, 3, &["f"]);
        let b = features(10, 3, &["g"]);
        let report = compare_features(&a, &b, &Weights::default());
        assert_eq!(report.breakdown.functions, 0);
    }

    #[test]
    fn node_type_overlap_ratio() {
        let mut a = ParseFeatures::default();
        a.node_types.insert("identifier".to_string(), 4);
        a.node_types.insert("number_literal".to_string(), 2);
        let mut b = ParseFeatures::default();
        b.node_types.insert("identifier".to_string(), 2);
        let report = compare_features(&a, &b, &Weights::default());
        // min sum 2, max sum 6
        assert_eq!(report.breakdown.node_types, 33);
    }

    #[test]
    fn level_bands() {
        assert_eq!(SimilarityLevel::from_score(100), SimilarityLevel::Identical);
        assert_eq!(SimilarityLevel::from_score(95), SimilarityLevel::Identical);
        assert_eq!(SimilarityLevel::from_score(94), SimilarityLevel::VerySimilar);
        assert_eq!(SimilarityLevel::from_score(80), SimilarityLevel::VerySimilar);
        assert_eq!(SimilarityLevel::from_score(60), SimilarityLevel::Similar);
        assert_eq!(
            SimilarityLevel::from_score(40),
            SimilarityLevel::SomewhatSimilar
        );
        assert_eq!(SimilarityLevel::from_score(20), SimilarityLevel::Different);
        assert_eq!(
            SimilarityLevel::from_score(19),
            SimilarityLevel::VeryDifferent
        );
        assert_eq!(
            SimilarityLevel::from_score(0),
            SimilarityLevel::VeryDifferent
        );
    }

    #[test]
    fn level_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&SimilarityLevel::VerySimilar).unwrap();
        assert_eq!(json, "\"VERY_SIMILAR\"");
    }
}
