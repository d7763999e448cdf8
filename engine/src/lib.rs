//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports the public types and modules used by hosts and by
//! store implementations.

pub mod cell;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod store;
pub mod undo;

// Re-export commonly used types at the crate root
pub use cell::{CellInfo, CellTable};
pub use engine::{CellContent, Engine};
pub use error::EngineError;
pub use evaluator::EvalContext;
pub use store::{MemoryStore, Store, StoreError};
pub use undo::UndoLog;

// Re-export the formula language surface the engine API speaks
pub use parser::{Ast, CellId, ParseError};
