//! FILENAME: engine/src/engine.rs
//! PURPOSE: The public spreadsheet engine: eval, query, delete, copy,
//! clear, dump, and bulk snapshots over one sheet.
//! CONTEXT: Single-threaded and synchronous; every mutating operation is
//! a three-phase transaction (parse & stage, mutate memory, persist) that
//! rolls back through the undo log on any failure, so callers observe
//! either the pre-state or the fully updated post-state. The store is the
//! only collaborator; it holds formula text and nothing else, and the
//! engine rebuilds values and dependency edges by replaying it on open.

use crate::cell::CellTable;
use crate::error::EngineError;
use crate::evaluator::EvalContext;
use crate::store::{MemoryStore, Store};
use crate::undo::UndoLog;
use log::{debug, warn};
use parser::{parse, to_formula, CellId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A cell's user-facing snapshot: the cached value and the formula text
/// printed against the cell itself. Unknown and empty cells read as value
/// 0 with an empty formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellContent {
    pub value: f64,
    pub formula: String,
}

impl CellContent {
    pub fn empty() -> Self {
        CellContent {
            value: 0.0,
            formula: String::new(),
        }
    }
}

/// The spreadsheet engine for a single sheet.
pub struct Engine<S: Store> {
    pub(crate) sheet: String,
    pub(crate) cells: CellTable,
    pub(crate) undo: UndoLog,
    pub(crate) store: S,
}

impl Engine<MemoryStore> {
    /// An engine over a fresh volatile store. Nothing to replay.
    pub fn in_memory(sheet: impl Into<String>) -> Self {
        Engine {
            sheet: sheet.into(),
            cells: CellTable::new(),
            undo: UndoLog::new(),
            store: MemoryStore::new(),
        }
    }
}

impl<S: Store> Engine<S> {
    /// Opens a sheet over `store` and replays its persisted formulas.
    /// Each replayed formula runs as a normal transactional eval with the
    /// store write suppressed; the store holds ground facts, so any
    /// replay order reaches the same final state.
    pub fn open(sheet: impl Into<String>, store: S) -> Result<Self, EngineError> {
        let mut engine = Engine {
            sheet: sheet.into(),
            cells: CellTable::new(),
            undo: UndoLog::new(),
            store,
        };
        engine.load()?;
        Ok(engine)
    }

    fn load(&mut self) -> Result<(), EngineError> {
        let rows = self.store.read_formulas(&self.sheet)?;
        debug!("sheet {}: replaying {} formulas", self.sheet, rows.len());
        for (id, formula) in rows {
            self.eval_cell(id, &formula, false)?;
        }
        Ok(())
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Parses `formula` against `id`, installs it, and recomputes the
    /// cell and everything transitively dependent on it. Returns every
    /// recomputed value. On any error (parse, cycle, bounds, or store)
    /// the table is restored to its pre-call state and the error is
    /// rethrown.
    pub fn eval(&mut self, id: &str, formula: &str) -> Result<HashMap<CellId, f64>, EngineError> {
        let id = parse_id(id)?;
        self.eval_cell(id, formula, true)
    }

    fn eval_cell(
        &mut self,
        id: CellId,
        formula: &str,
        update_store: bool,
    ) -> Result<HashMap<CellId, f64>, EngineError> {
        debug!("eval {} = {:?}", id, formula);
        self.undo.reset();
        let result = self.install_and_eval(id, formula, update_store);
        if result.is_err() {
            self.rollback();
        }
        result
    }

    fn install_and_eval(
        &mut self,
        id: CellId,
        formula: &str,
        update_store: bool,
    ) -> Result<HashMap<CellId, f64>, EngineError> {
        let ast = parse(formula, id)?;

        let mut ctx = EvalContext::new(&mut self.cells, &mut self.undo);
        if let Some(old_ast) = ctx.take_ast(id) {
            ctx.remove_as_dependent(id, &old_ast)?;
        }
        ctx.install_ast(id, ast);
        let updates = ctx.eval_from_root(id)?;

        if update_store {
            self.store.update_cell(&self.sheet, id, formula)?;
        }
        Ok(updates)
    }

    /// The cell's current value and formula. Never mutates.
    pub fn query(&self, id: &str) -> Result<CellContent, EngineError> {
        let id = parse_id(id)?;
        self.query_id(id)
    }

    fn query_id(&self, id: CellId) -> Result<CellContent, EngineError> {
        match self.cells.get(id) {
            Some(cell) => match &cell.ast {
                Some(ast) => Ok(CellContent {
                    value: cell.value,
                    formula: to_formula(ast, id)?,
                }),
                None => Ok(CellContent::empty()),
            },
            None => Ok(CellContent::empty()),
        }
    }

    /// Drops the cell's formula and cascades the resulting zero through
    /// its dependents. Deleting an unknown or empty cell is a no-op in
    /// memory but still clears any stale persisted entry.
    pub fn delete(&mut self, id: &str) -> Result<HashMap<CellId, f64>, EngineError> {
        let id = parse_id(id)?;
        self.delete_cell(id)
    }

    fn delete_cell(&mut self, id: CellId) -> Result<HashMap<CellId, f64>, EngineError> {
        debug!("delete {}", id);
        self.undo.reset();
        let result = self.clear_and_cascade(id);
        if result.is_err() {
            self.rollback();
        }
        result
    }

    fn clear_and_cascade(&mut self, id: CellId) -> Result<HashMap<CellId, f64>, EngineError> {
        let occupied = self.cells.get(id).is_some_and(|cell| cell.ast.is_some());
        if !occupied {
            self.store.delete(&self.sheet, id)?;
            self.cells.remove_if_dead(id);
            return Ok(HashMap::new());
        }

        let mut ctx = EvalContext::new(&mut self.cells, &mut self.undo);
        if let Some(old_ast) = ctx.take_ast(id) {
            ctx.remove_as_dependent(id, &old_ast)?;
        }
        // The cell is empty now; re-evaluating forward reads it as 0 and
        // propagates the change through every dependent.
        let updates = ctx.eval_from_root(id)?;

        self.store.delete(&self.sheet, id)?;
        self.cells.remove_if_dead(id);
        Ok(updates)
    }

    /// Reprints the source formula against `dest` (relative references
    /// shift, pinned ones stay) and evaluates the result there. Copying
    /// an empty source erases the destination.
    pub fn copy(&mut self, dest: &str, src: &str) -> Result<HashMap<CellId, f64>, EngineError> {
        let dest = parse_id(dest)?;
        let src = parse_id(src)?;
        debug!("copy {} -> {}", src, dest);

        match self.cells.get(src).and_then(|cell| cell.ast.clone()) {
            None => self.delete_cell(dest),
            Some(ast) => {
                let formula = to_formula(&ast, dest)?;
                self.eval_cell(dest, &formula, true)
            }
        }
    }

    /// Wipes every cell and the sheet's persistence. Not undoable.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        debug!("clear sheet {}", self.sheet);
        self.cells.clear();
        self.undo.reset();
        self.store.clear(&self.sheet)?;
        Ok(())
    }

    /// All non-empty cells as `(id, formula)` pairs, ordered so that
    /// every cell appears after its prerequisites: primary by dependency
    /// depth, secondary lexicographic by cell id. Feeding the pairs back
    /// through `eval` in order reconstructs the sheet.
    pub fn dump(&self) -> Result<Vec<(CellId, String)>, EngineError> {
        let occupied: HashSet<CellId> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.ast.is_some())
            .map(|(id, _)| *id)
            .collect();

        // Prerequisites of C: non-empty cells P with C among P's
        // dependents.
        let mut prerequisites: HashMap<CellId, HashSet<CellId>> = HashMap::new();
        for (&p, info) in self.cells.iter() {
            if !occupied.contains(&p) {
                continue;
            }
            for &dependent in &info.dependents {
                if occupied.contains(&dependent) {
                    prerequisites.entry(dependent).or_default().insert(p);
                }
            }
        }

        let mut out = Vec::with_capacity(occupied.len());
        let mut emitted: HashSet<CellId> = HashSet::new();
        let mut remaining: Vec<CellId> = occupied.into_iter().collect();

        while !remaining.is_empty() {
            let mut layer: Vec<CellId> = remaining
                .iter()
                .copied()
                .filter(|id| {
                    prerequisites
                        .get(id)
                        .is_none_or(|ps| ps.iter().all(|p| emitted.contains(p)))
                })
                .collect();
            if layer.is_empty() {
                // Unreachable between operations: the table is acyclic.
                break;
            }
            layer.sort_by_key(|id| id.to_string());

            for &id in &layer {
                emitted.insert(id);
            }
            remaining.retain(|id| !emitted.contains(id));

            for id in layer {
                if let Some(ast) = self.cells.get(id).and_then(|cell| cell.ast.as_ref()) {
                    out.push((id, to_formula(ast, id)?));
                }
            }
        }

        Ok(out)
    }

    /// Bulk snapshot: value and formula for each requested id, defaulting
    /// to every non-empty cell.
    pub fn value_formulas(
        &self,
        ids: Option<&[&str]>,
    ) -> Result<HashMap<CellId, CellContent>, EngineError> {
        let ids: Vec<CellId> = match ids {
            Some(texts) => texts
                .iter()
                .map(|text| parse_id(text))
                .collect::<Result<_, _>>()?,
            None => self.dump()?.into_iter().map(|(id, _)| id).collect(),
        };

        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            out.insert(id, self.query_id(id)?);
        }
        Ok(out)
    }

    /// Releases the store handle.
    pub fn close(mut self) -> Result<(), EngineError> {
        self.store.close()?;
        Ok(())
    }

    fn rollback(&mut self) {
        warn!(
            "sheet {}: operation failed, restoring {} cells",
            self.sheet,
            self.undo.staged_count()
        );
        self.undo.restore(&mut self.cells);
    }
}

fn parse_id(text: &str) -> Result<CellId, EngineError> {
    Ok(text.parse::<CellId>()?)
}
