//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Recomputes a cell and everything that transitively depends on
//! it, keeping the dependency graph synchronized with the ASTs.
//! CONTEXT: Walking an AST is also what discovers references, so the
//! evaluator doubles as the edge installer: reading through a `Ref` leaf
//! inserts the evaluating cell into the referenced cell's dependents
//! (idempotently, creating the referenced record if needed). Before a
//! cell's formula is replaced, the old AST is walked in reverse to prune
//! the edges it contributed. Cycles are detected at evaluation time via
//! the DFS visiting set, not when the AST is installed.
//!
//! Every mutation goes through `update`, which stages the cell's
//! pre-state in the undo log on first touch, so a failed evaluation can
//! be rolled back completely.

use crate::cell::{CellInfo, CellTable};
use crate::error::EngineError;
use crate::undo::UndoLog;
use parser::{Ast, CellId, FnId};
use std::collections::{HashMap, HashSet};

/// Mutable view of the table and undo log for the duration of one
/// operation.
pub struct EvalContext<'a> {
    cells: &'a mut CellTable,
    undo: &'a mut UndoLog,
}

impl<'a> EvalContext<'a> {
    pub fn new(cells: &'a mut CellTable, undo: &'a mut UndoLog) -> Self {
        EvalContext { cells, undo }
    }

    /// Stages the cell's prior state on first touch, then applies the
    /// mutation to the live record (created empty when absent).
    fn update<R>(&mut self, id: CellId, apply: impl FnOnce(&mut CellInfo) -> R) -> R {
        if !self.undo.is_staged(id) {
            self.undo.stage(id, self.cells.get(id).cloned());
        }
        apply(self.cells.get_or_insert(id))
    }

    /// Removes and returns the cell's current AST, staging undo.
    pub fn take_ast(&mut self, id: CellId) -> Option<Ast> {
        self.update(id, |cell| cell.ast.take())
    }

    /// Installs a freshly parsed AST, staging undo.
    pub fn install_ast(&mut self, id: CellId, ast: Ast) {
        self.update(id, |cell| cell.ast = Some(ast));
    }

    /// Reverse walk of a replaced AST: deletes `owner` from the
    /// dependents of every cell the old formula referenced.
    pub fn remove_as_dependent(&mut self, owner: CellId, ast: &Ast) -> Result<(), EngineError> {
        match ast {
            Ast::Num(_) => Ok(()),
            Ast::Ref(cell_ref) => {
                let target = cell_ref.resolve(owner)?;
                self.update(target, |cell| {
                    cell.dependents.remove(&owner);
                });
                Ok(())
            }
            Ast::App { args, .. } => {
                for arg in args {
                    self.remove_as_dependent(owner, arg)?;
                }
                Ok(())
            }
        }
    }

    /// Recomputes `root`, then recursively every cell that depends on it.
    /// Returns the map of all recomputed values. A cell re-entered while
    /// still on the DFS stack is a circular reference.
    pub fn eval_from_root(
        &mut self,
        root: CellId,
    ) -> Result<HashMap<CellId, f64>, EngineError> {
        let mut visiting = HashSet::new();
        let mut updates = HashMap::new();
        self.eval_one(root, &mut visiting, &mut updates)?;
        Ok(updates)
    }

    fn eval_one(
        &mut self,
        id: CellId,
        visiting: &mut HashSet<CellId>,
        updates: &mut HashMap<CellId, f64>,
    ) -> Result<(), EngineError> {
        if !visiting.insert(id) {
            return Err(EngineError::CircularRef(id));
        }

        let ast = self.cells.get(id).and_then(|cell| cell.ast.clone());
        let value = match &ast {
            Some(ast) => self.eval_ast(id, ast)?,
            None => 0.0,
        };
        self.update(id, |cell| cell.value = value);
        updates.insert(id, value);

        // Snapshot and order the dependents: evaluating them can grow the
        // live set, and a stable order keeps reruns deterministic.
        let mut dependents: Vec<CellId> = self
            .cells
            .get(id)
            .map(|cell| cell.dependents.iter().copied().collect())
            .unwrap_or_default();
        dependents.sort();
        for dependent in dependents {
            self.eval_one(dependent, visiting, updates)?;
        }

        visiting.remove(&id);
        Ok(())
    }

    /// Computes the value of an AST owned by `base`, installing a
    /// dependency edge at every reference leaf.
    fn eval_ast(&mut self, base: CellId, ast: &Ast) -> Result<f64, EngineError> {
        match ast {
            Ast::Num(n) => Ok(*n),

            Ast::Ref(cell_ref) => {
                let target = cell_ref.resolve(base)?;
                self.update(target, |cell| {
                    cell.dependents.insert(base);
                });
                Ok(self.cells.get(target).map(|cell| cell.value).unwrap_or(0.0))
            }

            Ast::App { func, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_ast(base, arg)?);
                }
                Ok(apply(*func, &values))
            }
        }
    }
}

/// Applies a function to its evaluated arguments. Division follows IEEE
/// 754 with no divide-by-zero guard; the resulting infinity or NaN is
/// stored as-is.
fn apply(func: FnId, values: &[f64]) -> f64 {
    match (func, values) {
        (FnId::Add, [a, b]) => a + b,
        (FnId::Sub, [a, b]) => a - b,
        (FnId::Mul, [a, b]) => a * b,
        (FnId::Div, [a, b]) => a / b,
        (FnId::Neg, [a]) => -a,
        (FnId::Min, values) if !values.is_empty() => {
            values.iter().copied().fold(f64::INFINITY, f64::min)
        }
        (FnId::Max, values) if !values.is_empty() => {
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        }
        // The parser enforces arity; only a hand-built AST can get here.
        _ => f64::NAN,
    }
}
