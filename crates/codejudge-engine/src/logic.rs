//! Operation-level logic checking.
//!
//! The checker compares reference and candidate operation histograms over
//! the critical opcode alphabet and inspects the candidate for the
//! hardcoded-return pattern: a program that returns a numeric literal
//! without performing any arithmetic. Missing or extra critical operations
//! fail the check; count mismatches alone do not -- they mark a different
//! but plausibly valid implementation and clear `exact_match` only.

use serde::Serialize;

use codejudge_tac::{Instruction, NormalizedProgram, OpHistogram, Opcode};

/// Opcodes whose presence defines the shape of an algorithm.
pub const CRITICAL_OPCODES: [Opcode; 5] = [
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Call,
];

/// One opcode counted differently by the two programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub op: String,
    pub reference: u32,
    pub user: u32,
}

/// Structured histogram comparison.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpComparison {
    /// Critical opcodes the reference uses and the candidate never does.
    pub missing: Vec<String>,
    /// Critical opcodes the candidate uses and the reference never does.
    pub extra: Vec<String>,
    /// Countable opcodes both use, with different counts.
    pub mismatched_counts: Vec<CountMismatch>,
}

/// A literal returned by a program that computes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardcodedReturn {
    pub constant: String,
}

/// The logic checker's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct LogicReport {
    pub passed: bool,
    pub exact_match: bool,
    /// User-visible sentence.
    pub message: String,
    /// Short tag for the headline finding.
    pub reason: String,
    pub comparison: OpComparison,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardcoded_return: Option<HardcodedReturn>,
}

/// Compares the two histograms and inspects the candidate program.
///
/// `passed` holds iff no critical opcode is missing or extra and no
/// hardcoded return was found; `exact_match` additionally requires every
/// countable opcode's count to agree.
pub fn check_logic(
    reference_ops: &OpHistogram,
    candidate_ops: &OpHistogram,
    candidate: &NormalizedProgram,
) -> LogicReport {
    let mut comparison = OpComparison::default();

    for op in CRITICAL_OPCODES {
        let reference = reference_ops.get(op);
        let user = candidate_ops.get(op);
        if reference > 0 && user == 0 {
            comparison.missing.push(op.name().to_string());
        } else if reference == 0 && user > 0 {
            comparison.extra.push(op.name().to_string());
        }
    }

    // Count mismatches span the whole countable alphabet: a candidate that
    // loads and stores twice as often as the reference is not an exact
    // match even when the critical shape agrees.
    for op in Opcode::ALL {
        if !op.is_countable() {
            continue;
        }
        let reference = reference_ops.get(op);
        let user = candidate_ops.get(op);
        if reference > 0 && user > 0 && reference != user {
            comparison.mismatched_counts.push(CountMismatch {
                op: op.name().to_string(),
                reference,
                user,
            });
        }
    }

    let hardcoded_return = detect_hardcoded_return(candidate);
    let passed = comparison.missing.is_empty()
        && comparison.extra.is_empty()
        && hardcoded_return.is_none();
    let exact_match = passed && comparison.mismatched_counts.is_empty();

    let (reason, message) = describe(&comparison, hardcoded_return.as_ref());

    LogicReport {
        passed,
        exact_match,
        message,
        reason,
        comparison,
        hardcoded_return,
    }
}

/// Flags a candidate that returns a numeric literal without computing
/// anything: at least one return, zero arithmetic instructions, and a
/// literal return operand. Only the candidate is inspected.
pub fn detect_hardcoded_return(candidate: &NormalizedProgram) -> Option<HardcodedReturn> {
    let has_return = candidate
        .instructions
        .iter()
        .any(|i| i.opcode() == Opcode::Return);
    let has_arith = candidate.instructions.iter().any(|i| i.opcode().is_arith());
    if !has_return || has_arith {
        return None;
    }
    candidate.instructions.iter().find_map(|i| match i {
        Instruction::Return { value: Some(value) } if value.is_numeric() => {
            Some(HardcodedReturn {
                constant: value.text().to_string(),
            })
        }
        _ => None,
    })
}

/// Deterministic (reason, message) pair for the strongest finding:
/// hardcoded return, then missing, then extra, then count mismatch.
fn describe(
    comparison: &OpComparison,
    hardcoded: Option<&HardcodedReturn>,
) -> (String, String) {
    if let Some(finding) = hardcoded {
        return (
            format!("Hardcoded return value detected: {}", finding.constant),
            format!(
                "The submission returns the constant {} without computing it.",
                finding.constant
            ),
        );
    }
    if !comparison.missing.is_empty() {
        let joined = comparison.missing.join(", ");
        return (
            format!("Missing operations: {}", joined),
            format!("The submission never performs: {}.", joined),
        );
    }
    if !comparison.extra.is_empty() {
        let joined = comparison.extra.join(", ");
        return (
            format!("Extra operations: {}", joined),
            format!(
                "The submission performs operations the reference does not: {}.",
                joined
            ),
        );
    }
    if !comparison.mismatched_counts.is_empty() {
        return (
            "Operation count mismatch".to_string(),
            "Operation counts differ from the reference; this may still be a valid \
             implementation."
                .to_string(),
        );
    }
    (
        "TAC operations match".to_string(),
        "The submission's operations match the reference.".to_string(),
    )
}
