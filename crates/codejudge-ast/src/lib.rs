//! Parse-tree features and syntactic similarity.
//!
//! The pipeline here is: parse a source program ([`parse_source`]), walk the
//! tree once into a [`ParseFeatures`] bundle ([`extract_features`]), score
//! two bundles ([`compare_features`]), and optionally boost the scores when
//! the pair differs only in style ([`adjust`]).

pub mod adjust;
pub mod compare;
pub mod error;
pub mod features;
pub mod tree;

pub use adjust::{
    adjust_syntactic, analyze_equivalence, assess_instruction_counts,
    has_intermediate_variables, EfficiencyRating, EquivalenceAnalysis, IrAssessment,
};
pub use compare::{
    compare_features, ScoreBreakdown, SimilarityDetails, SimilarityLevel, SimilarityReport,
    Weights,
};
pub use error::AstError;
pub use features::{extract_features, ControlFlowCounts, OperationCounts, ParseFeatures};
pub use tree::{parse_source, AstNode, Language, ParsedTree, SourceNode};
