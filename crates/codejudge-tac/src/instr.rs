//! Three-address instruction model.
//!
//! [`Instruction`] is a tagged enum over the opcode alphabet: each variant
//! carries exactly the operand record its opcode needs, so the downstream
//! filter and counting passes are a match over tags rather than a walk over
//! loosely typed fields.
//!
//! Operands keep their textual form. Before renaming they carry the IR's
//! `%` sigil; after renaming every temporary is a dense `t1, t2, ...` name
//! assigned in first-use order. Constants and `@`-sigil symbols pass through
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary arithmetic opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Signed and unsigned division both collapse to `div`; the distinction
    /// carries no weight for operation counting.
    Div,
}

impl BinOp {
    /// `add` and `mul` accept their operands in either order, so the
    /// canonicalization pass may sort them.
    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul)
    }

    pub fn opcode(self) -> Opcode {
        match self {
            BinOp::Add => Opcode::Add,
            BinOp::Sub => Opcode::Sub,
            BinOp::Mul => Opcode::Mul,
            BinOp::Div => Opcode::Div,
        }
    }
}

/// The full opcode alphabet.
///
/// `alloca` is recognized by the normalizer but dropped by the final filter
/// pass; it stays in the alphabet so histograms built from pre-filter data
/// keep a slot for it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Call,
    Return,
    Load,
    Store,
    Alloca,
}

impl Opcode {
    /// Every opcode, in histogram slot order.
    pub const ALL: [Opcode; 9] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Call,
        Opcode::Return,
        Opcode::Load,
        Opcode::Store,
        Opcode::Alloca,
    ];

    /// Opcodes retained by the normalizer's final filter pass.
    pub fn is_countable(self) -> bool {
        !matches!(self, Opcode::Alloca)
    }

    /// The arithmetic subset.
    pub fn is_arith(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div)
    }

    /// Opcodes whose presence defines the shape of an algorithm; the logic
    /// check compares these between reference and candidate.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Call
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Alloca => "alloca",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single operand in textual form: an SSA temporary, a numeric constant,
/// or a global symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operand(String);

impl Operand {
    pub fn new(text: impl Into<String>) -> Self {
        Operand(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// True for a not-yet-renamed SSA temporary (`%`-sigil).
    pub fn is_temp(&self) -> bool {
        self.0.starts_with('%')
    }

    /// True for a global symbol (`@`-sigil).
    pub fn is_symbol(&self) -> bool {
        self.0.starts_with('@')
    }

    /// True when the operand parses as an integer or decimal literal.
    pub fn is_numeric(&self) -> bool {
        let digits = self.0.strip_prefix('-').unwrap_or(&self.0);
        if digits.is_empty() {
            return false;
        }
        let mut seen_dot = false;
        digits.chars().all(|c| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                c.is_ascii_digit()
            }
        })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Stack slot reservation; dropped by the filter pass.
    Alloca { dest: Operand },
    /// Write `value` to the slot at `addr`.
    Store { value: Operand, addr: Operand },
    /// Read the slot at `addr` into `dest`.
    Load { dest: Operand, addr: Operand },
    /// Binary arithmetic.
    Binary {
        op: BinOp,
        dest: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    /// Direct call; the destination is absent for void calls.
    Call {
        dest: Option<Operand>,
        func: Operand,
    },
    /// Function return; the value is absent for `ret void`.
    Return { value: Option<Operand> },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Alloca { .. } => Opcode::Alloca,
            Instruction::Store { .. } => Opcode::Store,
            Instruction::Load { .. } => Opcode::Load,
            Instruction::Binary { op, .. } => op.opcode(),
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Return { .. } => Opcode::Return,
        }
    }

    /// Visits every operand field mutably, destination first, then sources
    /// in their textual order. The renaming pass relies on this order being
    /// stable.
    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut Operand)) {
        match self {
            Instruction::Alloca { dest } => f(dest),
            Instruction::Store { value, addr } => {
                f(value);
                f(addr);
            }
            Instruction::Load { dest, addr } => {
                f(dest);
                f(addr);
            }
            Instruction::Binary { dest, lhs, rhs, .. } => {
                f(dest);
                f(lhs);
                f(rhs);
            }
            Instruction::Call { dest, .. } => {
                if let Some(dest) = dest {
                    f(dest);
                }
            }
            Instruction::Return { value } => {
                if let Some(value) = value {
                    f(value);
                }
            }
        }
    }

    /// The returned operand, if this is a value-carrying `return`.
    pub fn return_value(&self) -> Option<&Operand> {
        match self {
            Instruction::Return { value } => value.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { dest } => write!(f, "{} = alloca", dest),
            Instruction::Store { value, addr } => write!(f, "store {}, {}", value, addr),
            Instruction::Load { dest, addr } => write!(f, "{} = load {}", dest, addr),
            Instruction::Binary { op, dest, lhs, rhs } => {
                write!(f, "{} = {} {}, {}", dest, op.opcode(), lhs, rhs)
            }
            Instruction::Call {
                dest: Some(dest),
                func,
            } => write!(f, "{} = call {}", dest, func),
            Instruction::Call { dest: None, func } => write!(f, "call {}", func),
            Instruction::Return { value: Some(value) } => write!(f, "return {}", value),
            Instruction::Return { value: None } => write!(f, "return"),
        }
    }
}

/// An ordered, canonicalized instruction sequence for one source program.
///
/// Invariants established by the normalizer: temporaries are `t1, t2, ...`
/// in first-use order, commutative operand pairs are sorted, and every
/// instruction's opcode is countable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedProgram {
    pub instructions: Vec<Instruction>,
}

impl NormalizedProgram {
    /// Number of instructions surviving the filter pass.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// The full listing, one instruction per line. Used in judge prompts
    /// and CLI dumps.
    pub fn listing(&self) -> String {
        self.instructions
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commutative_opcodes() {
        assert!(BinOp::Add.is_commutative());
        assert!(BinOp::Mul.is_commutative());
        assert!(!BinOp::Sub.is_commutative());
        assert!(!BinOp::Div.is_commutative());
    }

    #[test]
    fn countable_excludes_only_alloca() {
        for op in Opcode::ALL {
            assert_eq!(op.is_countable(), op != Opcode::Alloca, "{:?}", op);
        }
    }

    #[test]
    fn critical_subset() {
        let critical: Vec<Opcode> = Opcode::ALL
            .into_iter()
            .filter(|op| op.is_critical())
            .collect();
        assert_eq!(
            critical,
            vec![Opcode::Add, Opcode::Sub, Opcode::Mul, Opcode::Div, Opcode::Call]
        );
    }

    #[test]
    fn operand_numeric_detection() {
        assert!(Operand::new("8").is_numeric());
        assert!(Operand::new("-42").is_numeric());
        assert!(Operand::new("3.14").is_numeric());
        assert!(!Operand::new("1.2.3").is_numeric());
        assert!(!Operand::new("%5").is_numeric());
        assert!(!Operand::new("@main").is_numeric());
        assert!(!Operand::new("-").is_numeric());
    }

    #[test]
    fn display_forms() {
        let add = Instruction::Binary {
            op: BinOp::Add,
            dest: Operand::new("t3"),
            lhs: Operand::new("t1"),
            rhs: Operand::new("t2"),
        };
        assert_eq!(add.to_string(), "t3 = add t1, t2");

        let store = Instruction::Store {
            value: Operand::new("t1"),
            addr: Operand::new("t2"),
        };
        assert_eq!(store.to_string(), "store t1, t2");

        let call = Instruction::Call {
            dest: None,
            func: Operand::new("@puts"),
        };
        assert_eq!(call.to_string(), "call @puts");

        let ret = Instruction::Return { value: None };
        assert_eq!(ret.to_string(), "return");
    }

    #[test]
    fn serde_opcode_names() {
        let json = serde_json::to_string(&Opcode::Return).unwrap();
        assert_eq!(json, "\"return\"");
        let back: Opcode = serde_json::from_str("\"div\"").unwrap();
        assert_eq!(back, Opcode::Div);
    }
}
