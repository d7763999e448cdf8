//! FILENAME: engine/src/store.rs
//! PURPOSE: The persistence collaborator contract, plus the in-memory
//! implementation used by default and in tests.
//! CONTEXT: The store holds the ground facts of a sheet: an unordered set
//! of `(cellId, formula)` pairs. No dependency information and no cached
//! values are ever persisted; replaying the formulas through the engine
//! reconstructs both. The core stays synchronous; a host that wants an
//! async backend wraps it behind this trait and blocks inside the calls.

use parser::CellId;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// A failure reported by a store implementation. The engine surfaces it
/// under the `DB` error code after rolling back the operation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
        }
    }
}

/// Key/value persistence of `(sheet, cellId) -> formula` text.
pub trait Store {
    /// All persisted formulas for a sheet, in a stable order.
    fn read_formulas(&mut self, sheet: &str) -> Result<Vec<(CellId, String)>, StoreError>;

    /// Inserts or replaces one cell's formula text.
    fn update_cell(&mut self, sheet: &str, id: CellId, formula: &str) -> Result<(), StoreError>;

    /// Removes one cell's entry. Removing an absent entry is not an error.
    fn delete(&mut self, sheet: &str, id: CellId) -> Result<(), StoreError>;

    /// Removes every entry of a sheet.
    fn clear(&mut self, sheet: &str) -> Result<(), StoreError>;

    /// Releases the backing resource.
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Volatile store keeping each sheet as an ordered map. Backs
/// `Engine::in_memory` and the engine test suite; durable stores live in
/// the persistence crate.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: HashMap<String, BTreeMap<CellId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of persisted formulas for a sheet.
    pub fn formula_count(&self, sheet: &str) -> usize {
        self.sheets.get(sheet).map_or(0, |cells| cells.len())
    }
}

impl Store for MemoryStore {
    fn read_formulas(&mut self, sheet: &str) -> Result<Vec<(CellId, String)>, StoreError> {
        Ok(self
            .sheets
            .get(sheet)
            .map(|cells| {
                cells
                    .iter()
                    .map(|(id, formula)| (*id, formula.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update_cell(&mut self, sheet: &str, id: CellId, formula: &str) -> Result<(), StoreError> {
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .insert(id, formula.to_string());
        Ok(())
    }

    fn delete(&mut self, sheet: &str, id: CellId) -> Result<(), StoreError> {
        if let Some(cells) = self.sheets.get_mut(sheet) {
            cells.remove(&id);
        }
        Ok(())
    }

    fn clear(&mut self, sheet: &str) -> Result<(), StoreError> {
        self.sheets.remove(sheet);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
