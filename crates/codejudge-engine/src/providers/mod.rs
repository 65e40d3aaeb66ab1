//! External collaborator interfaces and adapters.
//!
//! The engine consumes two hosted collaborators: an IR producer and a
//! secondary judge. Both are traits so the orchestrator can be driven with
//! stubs in tests and offline presets from the CLI.

pub mod ir;
pub mod judge;

pub use ir::{FixedIrProducer, IrProducer, RemoteCompiler};
pub use judge::{
    fallback_judgment, ChatJudge, JudgeContext, JudgeProvider, Judgment, Recommendation,
    SecondaryJudge,
};
