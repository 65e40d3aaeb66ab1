//! Engine error kinds.
//!
//! Each variant corresponds to one failure class the orchestrator knows how
//! to degrade from: collaborator failures drop the affected sub-report,
//! while `InvalidInput` rejects the request outright.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the comparison engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required input (source text, feature bundle) is missing or unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The IR producer failed or returned nothing usable.
    #[error("IR producer unavailable: {0}")]
    IrUnavailable(String),

    /// The parser collaborator failed to produce a tree.
    #[error("parse tree unavailable: {0}")]
    ParseUnavailable(#[from] codejudge_ast::AstError),

    /// A sandboxed execution exceeded its deadline.
    #[error("execution timed out after {0:?}")]
    ExecTimeout(Duration),

    /// The secondary judge could not be reached.
    #[error("secondary judge unavailable: {0}")]
    JudgeUnavailable(String),

    /// The secondary judge answered, but not in the expected shape.
    /// The raw text is kept for the token-scan fallback.
    #[error("secondary judge returned a malformed response")]
    JudgeMalformed { raw: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Short machine-readable kind tag, surfaced in degraded verdicts.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid-input",
            EngineError::IrUnavailable(_) => "ir-unavailable",
            EngineError::ParseUnavailable(_) => "parse-unavailable",
            EngineError::ExecTimeout(_) => "exec-timeout",
            EngineError::JudgeUnavailable(_) => "judge-unavailable",
            EngineError::JudgeMalformed { .. } => "judge-malformed-response",
            EngineError::Io(_) => "io",
        }
    }
}
