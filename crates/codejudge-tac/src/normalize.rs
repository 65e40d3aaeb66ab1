//! Textual IR to three-address-code normalizer.
//!
//! [`normalize`] runs five deterministic passes over an SSA-form IR text:
//!
//! 1. **Clean** -- split into trimmed lines and drop everything that is not
//!    an instruction: blanks, `;` comments, `define`/`declare` headers,
//!    `attributes` declarations, metadata, and bare braces.
//! 2. **Convert** -- match each line against the opcode patterns and build
//!    an [`Instruction`]; unmatched lines are dropped.
//! 3. **Rename** -- replace every `%` temporary with a dense `t1, t2, ...`
//!    name assigned in first-use order.
//! 4. **Canonicalize** -- sort the operand pair of commutative opcodes
//!    (`add`, `mul`) lexicographically.
//! 5. **Filter** -- keep only the countable opcode subset.
//!
//! The normalizer never fails: malformed or unrecognized lines are silently
//! dropped, so a diagnostic-only text from the IR producer normalizes to an
//! empty program. Given byte-identical input the output is byte-identical.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::instr::{BinOp, Instruction, NormalizedProgram, Operand};

static FLAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(nsw|nuw|exact|inbounds)\b\s*").unwrap());

static ALLOCA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(%[^\s,=]+)\s*=\s*alloca\b").unwrap());

static STORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^store\s+\S+\s+([^,\s]+),\s*\S+\s+([%@][^,\s]+)").unwrap());

static LOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(%[^\s,=]+)\s*=\s*load\s+[^,]+,\s*\S+\s+([%@][^,\s]+)").unwrap());

static BINARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(%[^\s,=]+)\s*=\s*(add|sub|mul|sdiv|udiv)\s+\S+\s+([^,\s]+),\s*([^,\s]+)")
        .unwrap()
});

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(%[^\s,=]+)\s*=\s*)?call\s+[^@]*(@[\w.$-]+)\s*\(").unwrap()
});

static RET_VOID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ret\s+void\b").unwrap());

static RET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ret\s+\S+\s+([^,\s]+)").unwrap());

/// Runs the full pipeline on one IR text.
pub fn normalize(ir: &str) -> NormalizedProgram {
    let lines = clean(ir);
    let mut instructions: Vec<Instruction> = lines.iter().filter_map(|l| convert_line(l)).collect();
    rename(&mut instructions);
    canonicalize(&mut instructions);
    NormalizedProgram {
        instructions: filter(instructions),
    }
}

/// Trims and drops non-instruction lines.
fn clean(ir: &str) -> Vec<String> {
    ir.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !l.starts_with(';'))
        .filter(|l| !l.starts_with("define") && !l.starts_with("declare"))
        .filter(|l| !l.starts_with("attributes"))
        .filter(|l| !l.starts_with('!') && !l.contains("!dbg"))
        .filter(|l| *l != "{" && *l != "}")
        .map(str::to_string)
        .collect()
}

/// Matches one cleaned line against the opcode patterns.
///
/// Modifier flags are stripped first so `add nsw i32 %1, %2` matches the
/// same shape as the unflagged form. A call only matches when the line
/// (after the optional destination) begins with `call`, so `tail call`
/// lines are dropped like any other unrecognized line.
fn convert_line(line: &str) -> Option<Instruction> {
    let stripped = FLAGS_RE.replace_all(line, "");
    let line = stripped.as_ref();

    if let Some(c) = STORE_RE.captures(line) {
        return Some(Instruction::Store {
            value: Operand::new(&c[1]),
            addr: Operand::new(&c[2]),
        });
    }
    if RET_VOID_RE.is_match(line) {
        return Some(Instruction::Return { value: None });
    }
    if let Some(c) = RET_RE.captures(line) {
        return Some(Instruction::Return {
            value: Some(Operand::new(&c[1])),
        });
    }
    if let Some(c) = ALLOCA_RE.captures(line) {
        return Some(Instruction::Alloca {
            dest: Operand::new(&c[1]),
        });
    }
    if let Some(c) = LOAD_RE.captures(line) {
        return Some(Instruction::Load {
            dest: Operand::new(&c[1]),
            addr: Operand::new(&c[2]),
        });
    }
    if let Some(c) = BINARY_RE.captures(line) {
        let op = match &c[2] {
            "add" => BinOp::Add,
            "sub" => BinOp::Sub,
            "mul" => BinOp::Mul,
            _ => BinOp::Div,
        };
        return Some(Instruction::Binary {
            op,
            dest: Operand::new(&c[1]),
            lhs: Operand::new(&c[3]),
            rhs: Operand::new(&c[4]),
        });
    }
    if let Some(c) = CALL_RE.captures(line) {
        return Some(Instruction::Call {
            dest: c.get(1).map(|m| Operand::new(m.as_str())),
            func: Operand::new(&c[2]),
        });
    }
    None
}

/// Replaces every `%` temporary with `t1, t2, ...` in first-use order.
///
/// Only the first-use order of the input determines the mapping, so any
/// bijective renaming of the input temporaries yields the same output.
fn rename(instructions: &mut [Instruction]) {
    let mut names: HashMap<String, String> = HashMap::new();
    for instruction in instructions.iter_mut() {
        instruction.for_each_operand_mut(|operand| {
            if operand.is_temp() {
                let next = names.len() + 1;
                let fresh = names
                    .entry(operand.text().to_string())
                    .or_insert_with(|| format!("t{}", next));
                *operand = Operand::new(fresh.clone());
            }
        });
    }
}

/// Sorts the operand pair of commutative instructions lexicographically.
fn canonicalize(instructions: &mut [Instruction]) {
    for instruction in instructions.iter_mut() {
        if let Instruction::Binary { op, lhs, rhs, .. } = instruction {
            if op.is_commutative() && lhs.text() > rhs.text() {
                std::mem::swap(lhs, rhs);
            }
        }
    }
}

/// Keeps only instructions whose opcode is countable. Idempotent.
pub fn filter(instructions: Vec<Instruction>) -> Vec<Instruction> {
    instructions
        .into_iter()
        .filter(|i| i.opcode().is_countable())
        .collect()
}
