use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::datatable::{DataRow, DataTable, RowId};
use crate::error::{GridError, Result};

/// One cell's reversible change. Rows are addressed by stable id, not
/// index, so the delta stays valid however the view is re-filtered or
/// re-sorted between record and undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDelta {
    pub row_id: RowId,
    pub column: usize,
    pub old: String,
    pub new: String,
}

/// A row removed from the table, with everything needed to put it
/// back exactly where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedRow {
    pub index: usize,
    pub id: RowId,
    pub row: DataRow,
}

/// A complete reversible delta. Every mutating operation reduces to
/// one of three shapes:
/// - `SetCells`: single-cell edit, bulk column set, search/replace;
/// - `InsertRows`: add-empty-rows and duplicate-rows (ids recorded so
///   redo restores the same identities);
/// - `RemoveRows`: row deletion, with original positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditAction {
    SetCells { cells: Vec<CellDelta> },
    InsertRows {
        at: usize,
        ids: Vec<RowId>,
        rows: Vec<DataRow>,
    },
    RemoveRows { removed: Vec<RemovedRow> },
}

impl EditAction {
    /// True when applying the action would change nothing; no-ops are
    /// never pushed onto history.
    pub fn is_noop(&self) -> bool {
        match self {
            EditAction::SetCells { cells } => cells.iter().all(|c| c.old == c.new),
            EditAction::InsertRows { rows, .. } => rows.is_empty(),
            EditAction::RemoveRows { removed } => removed.is_empty(),
        }
    }

    /// Re-apply the forward direction (used by redo; the initial
    /// application is performed by the engine while it gathers the
    /// deltas).
    pub fn apply(&self, table: &mut DataTable) -> Result<()> {
        match self {
            EditAction::SetCells { cells } => {
                for delta in cells {
                    let idx = table
                        .index_of(delta.row_id)
                        .ok_or(GridError::RowMissing(delta.row_id))?;
                    table.set_value(idx, delta.column, delta.new.clone())?;
                }
            }
            EditAction::InsertRows { at, ids, rows } => {
                for (offset, (id, row)) in ids.iter().zip(rows.iter()).enumerate() {
                    table.insert_row_with_id(at + offset, row.clone(), *id);
                }
            }
            EditAction::RemoveRows { removed } => {
                // Remove by id, highest current index first, so the
                // remaining positions stay valid as we go
                let mut indices: Vec<usize> = removed
                    .iter()
                    .filter_map(|r| table.index_of(r.id))
                    .collect();
                indices.sort_unstable_by(|a, b| b.cmp(a));
                for idx in indices {
                    table.remove_row(idx);
                }
            }
        }
        Ok(())
    }

    /// Apply the inverse direction (undo).
    pub fn revert(&self, table: &mut DataTable) -> Result<()> {
        match self {
            EditAction::SetCells { cells } => {
                for delta in cells {
                    let idx = table
                        .index_of(delta.row_id)
                        .ok_or(GridError::RowMissing(delta.row_id))?;
                    table.set_value(idx, delta.column, delta.old.clone())?;
                }
            }
            EditAction::InsertRows { ids, .. } => {
                let mut indices: Vec<usize> =
                    ids.iter().filter_map(|&id| table.index_of(id)).collect();
                indices.sort_unstable_by(|a, b| b.cmp(a));
                for idx in indices {
                    table.remove_row(idx);
                }
            }
            EditAction::RemoveRows { removed } => {
                // Restore in ascending original order so each insert
                // lands at its recorded position
                let mut ordered = removed.clone();
                ordered.sort_unstable_by_key(|r| r.index);
                for r in ordered {
                    table.insert_row_with_id(r.index, r.row, r.id);
                }
            }
        }
        Ok(())
    }

    /// Cells touched by the forward direction, for the
    /// recently-edited highlight channel.
    pub fn touched_cells(&self) -> Vec<(RowId, usize)> {
        match self {
            EditAction::SetCells { cells } => cells
                .iter()
                .filter(|c| c.old != c.new)
                .map(|c| (c.row_id, c.column))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Bounded undo/redo stacks. Recording a new action clears the redo
/// side; both stacks cap at `limit`, discarding the oldest entries.
#[derive(Debug, Clone)]
pub struct History {
    past: Vec<EditAction>,
    future: Vec<EditAction>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Record an already-applied action. No-op actions are dropped.
    pub fn record(&mut self, action: EditAction) {
        if action.is_noop() {
            return;
        }
        self.future.clear();
        self.past.push(action);
        if self.past.len() > self.limit {
            self.past.remove(0);
        }
        debug!("History: {} undoable entries", self.past.len());
    }

    /// Revert the most recent action. Returns the action undone, or
    /// `None` when there is nothing to undo.
    ///
    /// A failing revert puts the entry back on the undo stack instead
    /// of silently dropping it.
    pub fn undo(&mut self, table: &mut DataTable) -> Result<Option<EditAction>> {
        let Some(action) = self.past.pop() else {
            return Ok(None);
        };
        if let Err(e) = action.revert(table) {
            self.past.push(action);
            return Err(e);
        }
        self.future.push(action.clone());
        if self.future.len() > self.limit {
            self.future.remove(0);
        }
        Ok(Some(action))
    }

    /// Re-apply the most recently undone action. A failing apply puts
    /// the entry back on the redo stack.
    pub fn redo(&mut self, table: &mut DataTable) -> Result<Option<EditAction>> {
        let Some(action) = self.future.pop() else {
            return Ok(None);
        };
        if let Err(e) = action.apply(table) {
            self.future.push(action);
            return Err(e);
        }
        self.past.push(action.clone());
        Ok(Some(action))
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
