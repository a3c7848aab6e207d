use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::datatable::{DataTable, PinSide};
use crate::data::filter::{ColumnFilter, FilterEngine};
use crate::data::sort::{SortEngine, SortSpec};

/// Optional restriction of the active row window, 1-based inclusive,
/// applied to the base sequence before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The full derived-view recipe: everything between the base row
/// sequence and what the windower sees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub filters: Vec<ColumnFilter>,
    pub global_filter: String,
    pub sorts: Vec<SortSpec>,
    pub row_range: Option<RowRange>,
}

/// A computed view over a [`DataTable`]: the ordered base-row indices
/// surviving range + filters + sort, and the visible columns split
/// into left-pinned / center / right-pinned groups.
///
/// Views are cheap to rebuild and are recomputed whenever the table or
/// the [`ViewState`] changes; they never mutate the table.
#[derive(Debug, Clone, Default)]
pub struct DataView {
    row_indices: Vec<usize>,
    left_pinned: Vec<usize>,
    center: Vec<usize>,
    right_pinned: Vec<usize>,
}

impl DataView {
    /// Compose the pipeline: base order → row range → filters → sort.
    ///
    /// Because the sort is stable and runs last over the filtered
    /// list, clearing all sorts restores the filtered (not the
    /// unfiltered) order, and re-applying identical state is
    /// idempotent.
    pub fn build(table: &DataTable, state: &ViewState) -> Self {
        let base: Vec<usize> = match state.row_range {
            Some(range) => {
                let start = range.start.max(1) - 1;
                let end = range.end.min(table.row_count());
                if start >= end {
                    Vec::new()
                } else {
                    (start..end).collect()
                }
            }
            None => (0..table.row_count()).collect(),
        };

        let filtered =
            FilterEngine::apply(table, &base, &state.filters, &state.global_filter);
        let row_indices = SortEngine::apply(table, filtered, &state.sorts);

        let mut left_pinned = Vec::new();
        let mut center = Vec::new();
        let mut right_pinned = Vec::new();
        for (idx, column) in table.columns.iter().enumerate() {
            if !column.visible {
                continue;
            }
            match column.pin {
                PinSide::Left => left_pinned.push(idx),
                PinSide::Right => right_pinned.push(idx),
                PinSide::None => center.push(idx),
            }
        }

        debug!(
            "View rebuilt: {} of {} rows, {}+{}+{} columns",
            row_indices.len(),
            table.row_count(),
            left_pinned.len(),
            center.len(),
            right_pinned.len()
        );

        Self {
            row_indices,
            left_pinned,
            center,
            right_pinned,
        }
    }

    /// Base-row indices in view order.
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    pub fn row_count(&self) -> usize {
        self.row_indices.len()
    }

    /// Base index of the view row at `view_idx`.
    pub fn base_index(&self, view_idx: usize) -> Option<usize> {
        self.row_indices.get(view_idx).copied()
    }

    /// Columns pinned to the left edge, always materialized.
    pub fn left_pinned(&self) -> &[usize] {
        &self.left_pinned
    }

    /// The horizontally virtualized middle region.
    pub fn center_columns(&self) -> &[usize] {
        &self.center
    }

    /// Columns pinned to the right edge, always materialized.
    pub fn right_pinned(&self) -> &[usize] {
        &self.right_pinned
    }

    /// All visible columns in render order: left pins, center, right
    /// pins.
    pub fn visible_columns(&self) -> Vec<usize> {
        let mut cols =
            Vec::with_capacity(self.left_pinned.len() + self.center.len() + self.right_pinned.len());
        cols.extend_from_slice(&self.left_pinned);
        cols.extend_from_slice(&self.center);
        cols.extend_from_slice(&self.right_pinned);
        cols
    }

    pub fn visible_column_count(&self) -> usize {
        self.left_pinned.len() + self.center.len() + self.right_pinned.len()
    }

    /// Cumulative pixel widths of the pinned regions; these are the
    /// fixed offsets bounding the virtualized center region.
    pub fn pinned_widths(&self, table: &DataTable) -> (u32, u32) {
        let sum = |cols: &[usize]| {
            cols.iter()
                .filter_map(|&idx| table.columns.get(idx))
                .map(|c| c.width)
                .sum()
        };
        (sum(&self.left_pinned), sum(&self.right_pinned))
    }

    /// Pixel widths of the center columns, in order.
    pub fn center_widths(&self, table: &DataTable) -> Vec<u32> {
        self.center
            .iter()
            .filter_map(|&idx| table.columns.get(idx))
            .map(|c| c.width)
            .collect()
    }

    /// Cell strings of one view row, restricted to visible columns.
    pub fn row_as_strings(&self, table: &DataTable, view_idx: usize) -> Option<Vec<String>> {
        let base = self.base_index(view_idx)?;
        Some(
            self.visible_columns()
                .iter()
                .map(|&col| table.get_value(base, col).unwrap_or("").to_string())
                .collect(),
        )
    }
}
