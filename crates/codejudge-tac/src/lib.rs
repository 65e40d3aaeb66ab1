//! Three-address-code model and IR normalizer.
//!
//! This crate turns SSA-form textual IR into a canonical three-address
//! instruction sequence ([`NormalizedProgram`]) and counts its operations
//! ([`OpHistogram`]). Both are pure, deterministic transformations over
//! owned inputs; nothing here performs I/O or fails.

pub mod histogram;
pub mod instr;
pub mod normalize;

pub use histogram::OpHistogram;
pub use instr::{BinOp, Instruction, NormalizedProgram, Opcode, Operand};
pub use normalize::normalize;
