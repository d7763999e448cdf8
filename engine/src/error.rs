//! FILENAME: engine/src/error.rs
//! PURPOSE: The engine-level error taxonomy.
//! CONTEXT: Every public operation surfaces one of four user-visible
//! error codes. Parser and printer failures convert into `Syntax` or
//! `Limits`; store collaborator failures are reported as `Db` after the
//! operation has been rolled back.

use crate::store::StoreError;
use parser::{CellId, ParseError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed formula, malformed cell reference, or an out-of-range
    /// coordinate hit while parsing or printing.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A cycle was detected during forward evaluation; the named cell
    /// lies on the cycle.
    #[error("circular reference involving cell {0}")]
    CircularRef(CellId),

    /// A row or column index outside the configured sheet maxima.
    #[error("limit exceeded: {0}")]
    Limits(String),

    /// Any failure reported by the store collaborator.
    #[error("store failure: {0}")]
    Db(#[from] StoreError),
}

impl EngineError {
    /// The user-visible error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Syntax(_) => "SYNTAX",
            EngineError::CircularRef(_) => "CIRCULAR_REF",
            EngineError::Limits(_) => "LIMITS",
            EngineError::Db(_) => "DB",
        }
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Syntax(msg) => EngineError::Syntax(msg),
            ParseError::Limits(msg) => EngineError::Limits(msg),
        }
    }
}
