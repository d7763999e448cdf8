//! FILENAME: engine/src/cell.rs
//! PURPOSE: The per-cell record and the table that owns all live cells.
//! CONTEXT: A cell stores its parsed formula, its cached value, and the
//! identifiers of the cells whose formulas reference it. Edges are kept
//! by identifier rather than by pointer, so the refers-to graph can be
//! arbitrarily shaped without creating ownership cycles.
//!
//! LIFECYCLE: A record is created lazily the first time a cell is
//! referenced, even while empty, so it can carry its back-edge set. It is
//! destroyed only when `delete` finds it empty with no dependents, or
//! when the whole table is cleared. A cell referenced by others therefore
//! survives the loss of its own formula (empty, value 0).

use parser::{Ast, CellId};
use std::collections::{HashMap, HashSet};

/// Engine-owned record for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellInfo {
    pub id: CellId,
    /// Parsed formula; `None` for an empty cell.
    pub ast: Option<Ast>,
    /// Cached result of the formula; 0 when empty.
    pub value: f64,
    /// Cells whose formulas reference this cell.
    pub dependents: HashSet<CellId>,
}

impl CellInfo {
    pub fn empty(id: CellId) -> Self {
        CellInfo {
            id,
            ast: None,
            value: 0.0,
            dependents: HashSet::new(),
        }
    }

    /// True when the cell carries no formula.
    pub fn is_empty(&self) -> bool {
        self.ast.is_none()
    }

    /// True when nothing keeps the record alive: no formula and no
    /// back-edges.
    pub fn is_dead(&self) -> bool {
        self.is_empty() && self.dependents.is_empty()
    }
}

/// Sparse ownership of all live cells, keyed by identifier.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CellTable {
    cells: HashMap<CellId, CellInfo>,
}

impl CellTable {
    pub fn new() -> Self {
        CellTable::default()
    }

    /// Lookup without side effects.
    pub fn get(&self, id: CellId) -> Option<&CellInfo> {
        self.cells.get(&id)
    }

    /// Returns the live record, creating an empty one if absent.
    pub fn get_or_insert(&mut self, id: CellId) -> &mut CellInfo {
        self.cells.entry(id).or_insert_with(|| CellInfo::empty(id))
    }

    /// Replaces a record wholesale. Used by undo restoration.
    pub fn insert(&mut self, id: CellId, info: CellInfo) {
        self.cells.insert(id, info);
    }

    /// Removes a record wholesale. Used by undo restoration.
    pub fn remove(&mut self, id: CellId) -> Option<CellInfo> {
        self.cells.remove(&id)
    }

    /// Erases the record iff it is empty and nothing references it.
    pub fn remove_if_dead(&mut self, id: CellId) {
        if self.cells.get(&id).is_some_and(|cell| cell.is_dead()) {
            self.cells.remove(&id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellId, &CellInfo)> {
        self.cells.iter()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
