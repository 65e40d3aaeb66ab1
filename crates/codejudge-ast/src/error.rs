//! Error types for parse-tree acquisition.

use thiserror::Error;

/// Errors produced while obtaining a parse tree.
///
/// Feature extraction itself never fails; only the parser boundary does.
#[derive(Debug, Error)]
pub enum AstError {
    /// The language tag names no bundled grammar.
    #[error("unsupported language tag: '{0}'")]
    UnsupportedLanguage(String),

    /// The grammar could not be loaded into the parser.
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// The parser produced no tree for the source.
    #[error("source produced no parse tree")]
    RootlessTree,
}
