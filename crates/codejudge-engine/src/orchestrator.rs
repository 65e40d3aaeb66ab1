//! End-to-end comparison pipeline.
//!
//! [`Engine::compare`] drives, in order: IR acquisition for both programs
//! (issued concurrently, each under its own deadline), TAC normalization,
//! parse-tree acquisition and feature extraction, syntactic scoring, the
//! logic check through the reference cache, stylistic adjustment, and --
//! when the logic check is inconclusive -- one secondary-judge
//! consultation. Collaborator failures degrade the verdict instead of
//! failing it: the affected sub-report is omitted and listed in
//! `unavailable`.

use tracing::{debug, warn};

use codejudge_ast::{
    adjust_syntactic, analyze_equivalence, assess_instruction_counts, compare_features,
    extract_features, parse_source, EquivalenceAnalysis, Language, ParseFeatures,
};
use codejudge_tac::{normalize, NormalizedProgram, OpHistogram};

use crate::cache::ReferenceCache;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::exec;
use crate::logic::{check_logic, LogicReport};
use crate::providers::judge::{fallback_judgment, JudgeContext, SecondaryJudge};
use crate::providers::IrProducer;
use crate::report::{ExecutionSection, UnavailableSection, Verdict};

/// Optional run-and-diff step.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stdin fed to both programs.
    pub stdin: Option<String>,
}

/// One comparison request: the two sources and their shared language.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub language: Language,
    pub reference_source: String,
    pub candidate_source: String,
    /// When set, compile and run both programs and diff their stdout.
    pub run: Option<RunOptions>,
}

/// Everything the IR side of the pipeline derived.
struct IrSide {
    reference_tac: NormalizedProgram,
    candidate_tac: NormalizedProgram,
    reference_ops: OpHistogram,
    candidate_ops: OpHistogram,
    report: LogicReport,
}

/// The comparison engine: configuration, the reference cache, and the two
/// hosted collaborators. Safe to share across concurrent requests; the
/// cache is the only shared mutable state.
pub struct Engine<P, J> {
    config: EngineConfig,
    cache: ReferenceCache,
    ir_producer: P,
    judge: Option<J>,
}

impl<P: IrProducer, J: SecondaryJudge> Engine<P, J> {
    pub fn new(config: EngineConfig, ir_producer: P, judge: Option<J>) -> Self {
        let cache = ReferenceCache::new(config.cache_ttl, config.cache_soft_limit);
        Engine {
            config,
            cache,
            ir_producer,
            judge,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline and fuses the signals into a [`Verdict`].
    pub async fn compare(&self, request: &CompareRequest) -> Verdict {
        let mut verdict = Verdict::default();
        let mut unavailable: Vec<UnavailableSection> = Vec::new();

        // IR acquisition and normalization.
        let ir_texts = self.acquire_ir(request).await;
        let tac_pair = match ir_texts {
            Ok((reference_ir, candidate_ir)) => {
                let pair = (normalize(&reference_ir), normalize(&candidate_ir));
                debug!(
                    reference_count = pair.0.instruction_count(),
                    candidate_count = pair.1.instruction_count(),
                    "normalized both programs"
                );
                Some(pair)
            }
            Err(err) => {
                warn!("IR side unavailable: {}", err);
                unavailable.push(UnavailableSection {
                    section: "logic".to_string(),
                    kind: err.kind().to_string(),
                    detail: err.to_string(),
                });
                None
            }
        };

        // Parse trees and feature extraction.
        let features_pair = self.extract_feature_pair(request, &mut unavailable);

        // Syntactic scoring and the stylistic-equivalence analysis.
        let mut analysis = EquivalenceAnalysis::default();
        if let Some((reference_features, candidate_features)) = &features_pair {
            let report =
                compare_features(reference_features, candidate_features, &self.config.weights);
            analysis = analyze_equivalence(
                reference_features,
                candidate_features,
                self.config.boost_intermediate,
            );
            let (adjusted, level) = adjust_syntactic(report.overall, &analysis);
            debug!(base = report.overall, adjusted, "syntactic comparison done");
            verdict.overall_similarity = Some(adjusted);
            verdict.similarity_level = Some(level);
            verdict.breakdown = Some(report.breakdown);
            verdict.details = Some(report.details);
        }

        // Logic check through the reference cache, then the count verdict.
        let ir_side = tac_pair.map(|(reference_tac, candidate_tac)| {
            let reference_ops =
                self.cache
                    .get_or_insert_with(request.language.tag(), &request.reference_source, || {
                        OpHistogram::from_instructions(&reference_tac.instructions)
                    });
            let candidate_ops = OpHistogram::from_instructions(&candidate_tac.instructions);
            let report = check_logic(&reference_ops, &candidate_ops, &candidate_tac);
            verdict.ir = Some(assess_instruction_counts(
                reference_tac.instruction_count(),
                candidate_tac.instruction_count(),
                &analysis,
                self.config.ir_minor_diff_floor,
                self.config.ir_minor_diff_margin,
            ));
            IrSide {
                reference_tac,
                candidate_tac,
                reference_ops,
                candidate_ops,
                report,
            }
        });

        // Second opinion, only when the logic check is inconclusive.
        if let (Some(judge), Some(side)) = (self.judge.as_ref(), ir_side.as_ref()) {
            let candidate_features = features_pair.as_ref().map(|(_, f)| f);
            if is_inconclusive(&side.report, candidate_features, &side.candidate_tac) {
                let context = JudgeContext {
                    language: request.language.tag(),
                    reference_source: &request.reference_source,
                    candidate_source: &request.candidate_source,
                    reference_tac: &side.reference_tac,
                    candidate_tac: &side.candidate_tac,
                    reference_ops: &side.reference_ops,
                    candidate_ops: &side.candidate_ops,
                    logic: &side.report,
                };
                match tokio::time::timeout(self.config.judge_timeout, judge.judge(&context)).await
                {
                    Ok(Ok(judgment)) => verdict.secondary = Some(judgment),
                    Ok(Err(EngineError::JudgeMalformed { raw })) => {
                        verdict.secondary = Some(fallback_judgment(&raw));
                    }
                    Ok(Err(err)) => {
                        warn!("secondary judge unavailable: {}", err);
                        unavailable.push(UnavailableSection {
                            section: "secondary".to_string(),
                            kind: err.kind().to_string(),
                            detail: err.to_string(),
                        });
                    }
                    Err(_) => {
                        unavailable.push(UnavailableSection {
                            section: "secondary".to_string(),
                            kind: "judge-unavailable".to_string(),
                            detail: format!(
                                "judge timed out after {:?}",
                                self.config.judge_timeout
                            ),
                        });
                    }
                }
            }
        }

        // Optional run-and-diff step.
        if let Some(run) = &request.run {
            verdict.execution = Some(self.run_both(request, run, &mut unavailable).await);
        }

        verdict.logic = ir_side.map(|side| side.report);
        let timed_out = verdict
            .execution
            .as_ref()
            .map(|e| e.timed_out)
            .unwrap_or(false);
        verdict.success = unavailable.is_empty() && !timed_out;
        if !verdict.success {
            let mut reasons: Vec<String> = unavailable
                .iter()
                .map(|u| format!("{} unavailable ({})", u.section, u.kind))
                .collect();
            if timed_out {
                reasons.push("execution timed out".to_string());
            }
            verdict.summary = Some(reasons.join("; "));
        }
        verdict.unavailable = unavailable;
        verdict
    }

    /// Issues both IR acquisitions concurrently, each under its own
    /// deadline.
    async fn acquire_ir(&self, request: &CompareRequest) -> Result<(String, String), EngineError> {
        let reference = tokio::time::timeout(
            self.config.ir_timeout,
            self.ir_producer
                .produce_ir(request.language, &request.reference_source),
        );
        let candidate = tokio::time::timeout(
            self.config.ir_timeout,
            self.ir_producer
                .produce_ir(request.language, &request.candidate_source),
        );
        let (reference, candidate) = tokio::join!(reference, candidate);
        let reference = reference.map_err(|_| {
            EngineError::IrUnavailable("IR acquisition timed out (reference)".to_string())
        })??;
        let candidate = candidate.map_err(|_| {
            EngineError::IrUnavailable("IR acquisition timed out (candidate)".to_string())
        })??;
        Ok((reference, candidate))
    }

    fn extract_feature_pair(
        &self,
        request: &CompareRequest,
        unavailable: &mut Vec<UnavailableSection>,
    ) -> Option<(ParseFeatures, ParseFeatures)> {
        let reference = parse_source(request.language, &request.reference_source);
        let candidate = parse_source(request.language, &request.candidate_source);
        match (reference, candidate) {
            (Ok(reference), Ok(candidate)) => Some((
                extract_features(&reference.root()),
                extract_features(&candidate.root()),
            )),
            (Err(err), _) | (_, Err(err)) => {
                let err = EngineError::from(err);
                warn!("syntactic side unavailable: {}", err);
                unavailable.push(UnavailableSection {
                    section: "syntactic".to_string(),
                    kind: err.kind().to_string(),
                    detail: err.to_string(),
                });
                None
            }
        }
    }

    async fn run_both(
        &self,
        request: &CompareRequest,
        run: &RunOptions,
        unavailable: &mut Vec<UnavailableSection>,
    ) -> ExecutionSection {
        let mut section = ExecutionSection::default();
        let stdin = run.stdin.as_deref();
        let (reference, candidate) = tokio::join!(
            exec::run_program(
                request.language,
                &request.reference_source,
                stdin,
                self.config.exec_timeout,
            ),
            exec::run_program(
                request.language,
                &request.candidate_source,
                stdin,
                self.config.exec_timeout,
            ),
        );
        for (result, slot) in [
            (reference, &mut section.reference),
            (candidate, &mut section.candidate),
        ] {
            match result {
                Ok(outcome) => *slot = Some(outcome),
                Err(EngineError::ExecTimeout(_)) => section.timed_out = true,
                Err(err) => {
                    warn!("execution unavailable: {}", err);
                    unavailable.push(UnavailableSection {
                        section: "execution".to_string(),
                        kind: err.kind().to_string(),
                        detail: err.to_string(),
                    });
                }
            }
        }
        if let (Some(reference), Some(candidate)) = (&section.reference, &section.candidate) {
            section.outputs_match = Some(reference.stdout == candidate.stdout);
        }
        section
    }
}

/// A logic result worth a second opinion: it passed with count mismatches,
/// or it failed while the candidate looks elaborate enough that a hardcode
/// verdict deserves confirmation.
fn is_inconclusive(
    report: &LogicReport,
    candidate_features: Option<&ParseFeatures>,
    candidate_tac: &NormalizedProgram,
) -> bool {
    if report.passed {
        return !report.comparison.mismatched_counts.is_empty();
    }
    looks_elaborate(candidate_features, candidate_tac)
}

/// Control flow or a non-trivial instruction count.
fn looks_elaborate(features: Option<&ParseFeatures>, tac: &NormalizedProgram) -> bool {
    features
        .map(|f| f.control_flow.total() > 0)
        .unwrap_or(false)
        || tac.instruction_count() >= 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_failures_are_conclusive() {
        let tac = normalize("ret i32 8");
        assert!(!looks_elaborate(None, &tac));
        assert!(!looks_elaborate(Some(&ParseFeatures::default()), &tac));
    }

    #[test]
    fn control_flow_marks_elaborate() {
        let mut features = ParseFeatures::default();
        features.control_flow.for_loops = 1;
        let tac = normalize("ret i32 8");
        assert!(looks_elaborate(Some(&features), &tac));
    }

    #[test]
    fn long_programs_mark_elaborate() {
        let lines: Vec<String> = (0..8)
            .map(|i| format!("%r{} = add i32 %a, {}", i, i))
            .collect();
        let tac = normalize(&lines.join("\n"));
        assert_eq!(tac.instruction_count(), 8);
        assert!(looks_elaborate(None, &tac));
    }
}
