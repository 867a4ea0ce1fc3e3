use crate::semantic_edit::SemanticEditKind;
use thiserror::Error;
use xsym_symbols::CompilationId;

/// Inconsistent input supplied by the EnC host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncError {
    #[error("update edit of {symbol} has no old symbol")]
    UpdateWithoutOldSymbol { symbol: String },
    #[error("{kind:?} edit has no new symbol")]
    MissingNewSymbol { kind: SemanticEditKind },
    #[error("symbol {symbol} is edited more than once")]
    DuplicateEdit { symbol: String },
    #[error("edited symbol {symbol} does not belong to compilation {compilation:?}")]
    SymbolNotInCompilation {
        symbol: String,
        compilation: CompilationId,
    },
}
