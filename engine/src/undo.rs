//! FILENAME: engine/src/undo.rs
//! PURPOSE: Per-operation shadow of mutated cells, restored on failure.
//! CONTEXT: Each public mutating operation resets the log, then stages the
//! prior state of every cell it touches, on the first touch only. On
//! success the log is simply discarded; on any error the engine replays
//! the snapshots, leaving the table exactly as it was before the
//! operation began. Operations touch few cells, so a shadow map of
//! pre-images stays cheap.

use crate::cell::{CellInfo, CellTable};
use parser::CellId;
use std::collections::HashMap;

/// Snapshot map of one in-flight operation. `None` records that the cell
/// did not exist before the operation.
#[derive(Debug, Default)]
pub struct UndoLog {
    snapshots: HashMap<CellId, Option<CellInfo>>,
}

impl UndoLog {
    pub fn new() -> Self {
        UndoLog::default()
    }

    /// Discards all snapshots. Called at the start of every mutating
    /// operation and after a successful commit.
    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    /// True when the cell's pre-state is already recorded.
    pub fn is_staged(&self, id: CellId) -> bool {
        self.snapshots.contains_key(&id)
    }

    /// Records the cell's pre-operation state. Later touches of the same
    /// cell leave the first snapshot in place.
    pub fn stage(&mut self, id: CellId, prior: Option<CellInfo>) {
        self.snapshots.entry(id).or_insert(prior);
    }

    /// Puts every touched cell back to its snapshot, deleting cells that
    /// did not exist before. The log is empty afterwards.
    pub fn restore(&mut self, cells: &mut CellTable) {
        for (id, snapshot) in self.snapshots.drain() {
            match snapshot {
                Some(info) => cells.insert(id, info),
                None => {
                    cells.remove(id);
                }
            }
        }
    }

    /// Number of cells staged by the current operation.
    pub fn staged_count(&self) -> usize {
        self.snapshots.len()
    }
}
