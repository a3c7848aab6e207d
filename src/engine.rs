use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::csv_source::CsvSource;
use crate::data::data_view::{DataView, RowRange, ViewState};
use crate::data::datatable::{ColumnType, DataRow, DataTable, PinSide, RowId};
use crate::data::exporter::Exporter;
use crate::data::filter::ColumnFilter;
use crate::data::history::{CellDelta, EditAction, History, RemovedRow};
use crate::data::sort::SortSpec;
use crate::data::store::{SessionSnapshot, SessionStore};
use crate::data::type_inference::TypeInference;
use crate::debouncer::Debouncer;
use crate::error::{GridError, Result};
use crate::highlight::RecentEdits;
use crate::viewport::{column_window, row_window, ColumnWindow, RowWindow};

/// Everything a host shell needs to render the grid, emitted through
/// the change callback after every state change.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    pub headers: Vec<String>,
    pub visible_headers: Vec<String>,
    /// Rows of the current view (range + filters + sort applied),
    /// restricted to visible columns, in render order.
    pub rows: Vec<Vec<String>>,
    pub file_name: Option<String>,
    pub column_filters: Vec<ColumnFilter>,
    pub global_filter: String,
    pub column_types: Vec<(String, ColumnType)>,
    pub sorting: Vec<SortSpec>,
    pub pinned_left: Vec<String>,
    pub pinned_right: Vec<String>,
    pub hidden_columns: Vec<String>,
    pub selection: Vec<RowId>,
    pub total_row_count: usize,
    pub visible_row_count: usize,
    pub column_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

type ChangeCallback = Box<dyn Fn(&GridSnapshot)>;

/// The engine facade: owns the table, the derived view, history,
/// selection, and the filter debouncers. Single-threaded; every
/// mutating operation runs to completion (or fails leaving state
/// untouched) before the next one is issued.
pub struct GridEngine {
    config: Config,
    table: DataTable,
    file_name: Option<String>,
    state: ViewState,
    view: DataView,
    history: History,
    selection: BTreeSet<RowId>,
    recent: RecentEdits,
    global_debounce: Debouncer<String>,
    filter_debounce: Debouncer<Vec<ColumnFilter>>,
    store: Option<SessionStore>,
    on_change: Option<ChangeCallback>,
}

impl GridEngine {
    pub fn new(config: Config) -> Self {
        let table = DataTable::new("empty");
        let view = DataView::build(&table, &ViewState::default());
        let debounce_ms = config.behavior.filter_debounce_ms;
        let history_limit = config.behavior.history_limit;
        let highlight_ttl = config.behavior.highlight_ttl_ms;
        Self {
            config,
            table,
            file_name: None,
            state: ViewState::default(),
            view,
            history: History::new(history_limit),
            selection: BTreeSet::new(),
            recent: RecentEdits::new(highlight_ttl),
            global_debounce: Debouncer::new(debounce_ms),
            filter_debounce: Debouncer::new(debounce_ms),
            store: None,
            on_change: None,
        }
    }

    /// Attach a persistence slot. Loads any stored session snapshot.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        if let Some(snapshot) = store.load() {
            let (table, file_name) = snapshot.into_table();
            info!(
                "Restored session: {} rows from {:?}",
                table.row_count(),
                file_name
            );
            self.table = table;
            self.file_name = file_name;
            TypeInference::infer_table(
                &mut self.table,
                self.config.behavior.inference_sample_size,
            );
            self.rebuild_view();
        }
        self.store = Some(store);
        self
    }

    /// Register the host callback invoked after every state change.
    pub fn on_change(&mut self, callback: impl Fn(&GridSnapshot) + 'static) {
        self.on_change = Some(Box::new(callback));
        self.emit();
    }

    // ---- ingestion -------------------------------------------------

    /// Load a CSV file, replacing any current data.
    pub fn load_csv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let (file_name, parsed) = CsvSource::load_from_file(path)?;
        self.install_data(file_name, parsed.headers, parsed.rows)
    }

    /// Load delimited text (e.g. a clipboard payload), replacing any
    /// current data.
    pub fn load_from_text(&mut self, text: &str, name: &str) -> Result<()> {
        let parsed = CsvSource::parse_text(text)?;
        self.install_data(name.to_string(), parsed.headers, parsed.rows)
    }

    /// Read the system clipboard and load its text.
    pub fn paste_from_clipboard(&mut self) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| GridError::ClipboardRead(e.to_string()))?;
        let text = clipboard
            .get_text()
            .map_err(|e| GridError::ClipboardRead(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(GridError::ClipboardRead("clipboard is empty".to_string()));
        }
        self.load_from_text(&text, "clipboard")
    }

    fn install_data(
        &mut self,
        name: String,
        headers: Vec<String>,
        rows: Vec<DataRow>,
    ) -> Result<()> {
        let mut table = DataTable::from_parts(name.clone(), headers, rows);
        for column in table.columns.iter_mut() {
            column.width = self.config.display.default_column_width;
            column.min_width = self.config.display.min_column_width;
            column.max_width = self.config.display.max_column_width;
        }
        TypeInference::infer_table(&mut table, self.config.behavior.inference_sample_size);

        self.table = table;
        self.file_name = Some(name);
        self.state = ViewState::default();
        self.history.clear();
        self.selection.clear();
        self.recent.clear();
        self.global_debounce.reset();
        self.filter_debounce.reset();
        self.rebuild_view();
        self.persist();
        self.emit();
        Ok(())
    }

    /// Drop all data and derived state.
    pub fn clear_data(&mut self) {
        self.table = DataTable::new("empty");
        self.file_name = None;
        self.state = ViewState::default();
        self.history.clear();
        self.selection.clear();
        self.recent.clear();
        self.global_debounce.reset();
        self.filter_debounce.reset();
        if let Some(store) = &self.store {
            store.clear();
        }
        self.rebuild_view();
        self.emit();
    }

    // ---- editing ---------------------------------------------------

    /// Edit one cell, addressed by stable row id and column name.
    /// Value-identical edits change nothing and leave history alone.
    pub fn set_cell(&mut self, row_id: RowId, column: &str, value: &str) -> Result<()> {
        let col_idx = self
            .table
            .column_index(column)
            .ok_or_else(|| GridError::ColumnNotFound(column.to_string()))?;
        let row_idx = self
            .table
            .index_of(row_id)
            .ok_or(GridError::RowMissing(row_id))?;

        let current = self.table.get_value(row_idx, col_idx).unwrap_or("");
        if current == value {
            return Ok(());
        }

        let old = self.table.set_value(row_idx, col_idx, value.to_string())?;
        self.commit(EditAction::SetCells {
            cells: vec![CellDelta {
                row_id,
                column: col_idx,
                old,
                new: value.to_string(),
            }],
        });
        Ok(())
    }

    /// Set every cell of a column (or only the selected rows') to one
    /// value. Returns the number of cells changed.
    pub fn set_column_values(
        &mut self,
        column: &str,
        value: &str,
        selected_only: bool,
    ) -> Result<usize> {
        let col_idx = self
            .table
            .column_index(column)
            .ok_or_else(|| GridError::ColumnNotFound(column.to_string()))?;

        let targets = if selected_only {
            if self.selection.is_empty() {
                return Err(GridError::NoSelection);
            }
            self.selected_indices()
        } else {
            (0..self.table.row_count()).collect()
        };

        let mut cells = Vec::new();
        for row_idx in targets {
            let current = self.table.get_value(row_idx, col_idx).unwrap_or("");
            if current == value {
                continue;
            }
            let row_id = match self.table.row_id(row_idx) {
                Some(id) => id,
                None => continue,
            };
            let old = self.table.set_value(row_idx, col_idx, value.to_string())?;
            cells.push(CellDelta {
                row_id,
                column: col_idx,
                old,
                new: value.to_string(),
            });
        }

        let changed = cells.len();
        self.commit(EditAction::SetCells { cells });
        Ok(changed)
    }

    /// Literal search-and-replace across all cells, optionally
    /// restricted to one column. Returns the number of cells changed.
    pub fn search_replace(
        &mut self,
        search: &str,
        replace: &str,
        column: Option<&str>,
    ) -> Result<usize> {
        if search.is_empty() {
            return Ok(0);
        }
        let col_filter = match column {
            Some(name) => Some(
                self.table
                    .column_index(name)
                    .ok_or_else(|| GridError::ColumnNotFound(name.to_string()))?,
            ),
            None => None,
        };

        let mut cells = Vec::new();
        for row_idx in 0..self.table.row_count() {
            let row_id = match self.table.row_id(row_idx) {
                Some(id) => id,
                None => continue,
            };
            for col_idx in 0..self.table.column_count() {
                if let Some(only) = col_filter {
                    if col_idx != only {
                        continue;
                    }
                }
                let current = self.table.get_value(row_idx, col_idx).unwrap_or("");
                if !current.contains(search) {
                    continue;
                }
                let new = current.replace(search, replace);
                let old = self.table.set_value(row_idx, col_idx, new.clone())?;
                cells.push(CellDelta {
                    row_id,
                    column: col_idx,
                    old,
                    new,
                });
            }
        }

        let changed = cells.len();
        debug!("search_replace: {} cells changed", changed);
        self.commit(EditAction::SetCells { cells });
        Ok(changed)
    }

    /// Append `count` empty rows at the end of the table.
    pub fn add_new_rows(&mut self, count: usize) -> Result<()> {
        if self.table.column_count() == 0 {
            return Err(GridError::EmptyInput);
        }
        if count == 0 {
            return Ok(());
        }
        let at = self.table.row_count();
        let width = self.table.column_count();
        let mut ids = Vec::with_capacity(count);
        let mut rows = Vec::with_capacity(count);
        for _ in 0..count {
            let row = DataRow::blank(width);
            ids.push(self.table.push_row(row.clone()));
            rows.push(row);
        }
        self.commit(EditAction::InsertRows { at, ids, rows });
        Ok(())
    }

    /// Append shallow copies of the selected rows at the end of the
    /// table, in base order. Returns the number of rows added.
    pub fn duplicate_selected_rows(&mut self) -> Result<usize> {
        if self.selection.is_empty() {
            return Err(GridError::NoSelection);
        }
        let at = self.table.row_count();
        let mut ids = Vec::new();
        let mut rows = Vec::new();
        for row_idx in self.selected_indices() {
            if let Some(row) = self.table.row(row_idx).cloned() {
                ids.push(self.table.push_row(row.clone()));
                rows.push(row);
            }
        }
        let added = rows.len();
        self.commit(EditAction::InsertRows { at, ids, rows });
        Ok(added)
    }

    /// Delete the selected rows. Returns the number of rows removed.
    pub fn delete_selected_rows(&mut self) -> Result<usize> {
        if self.selection.is_empty() {
            return Err(GridError::NoSelection);
        }
        let mut indices = self.selected_indices();
        indices.sort_unstable_by(|a, b| b.cmp(a));

        let mut removed = Vec::new();
        for idx in indices {
            if let Some((id, row)) = self.table.remove_row(idx) {
                removed.push(RemovedRow {
                    index: idx,
                    id,
                    row,
                });
            }
        }
        let count = removed.len();
        self.selection.clear();
        self.commit(EditAction::RemoveRows { removed });
        Ok(count)
    }

    pub fn undo(&mut self) -> Result<bool> {
        let undone = self.history.undo(&mut self.table)?;
        if let Some(action) = undone {
            self.recent.mark_all(action.touched_cells());
            self.prune_selection();
            self.rebuild_view();
            self.persist();
            self.emit();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        let redone = self.history.redo(&mut self.table)?;
        if let Some(action) = redone {
            self.recent.mark_all(action.touched_cells());
            self.prune_selection();
            self.rebuild_view();
            self.persist();
            self.emit();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ---- view state ------------------------------------------------

    /// Show or hide a column. With `visible` absent, toggles.
    pub fn toggle_column(&mut self, name: &str, visible: Option<bool>) -> Result<()> {
        let column = self
            .table
            .column_mut(name)
            .ok_or_else(|| GridError::ColumnNotFound(name.to_string()))?;
        column.visible = visible.unwrap_or(!column.visible);
        self.rebuild_view();
        self.emit();
        Ok(())
    }

    /// Pin a column to an edge, or unpin with [`PinSide::None`].
    /// Left and right pins are mutually exclusive by construction.
    pub fn pin_column(&mut self, name: &str, side: PinSide) -> Result<()> {
        let column = self
            .table
            .column_mut(name)
            .ok_or_else(|| GridError::ColumnNotFound(name.to_string()))?;
        column.pin = side;
        self.rebuild_view();
        self.emit();
        Ok(())
    }

    /// Restrict (or unrestrict) the active row window.
    pub fn set_row_range(&mut self, range: Option<RowRange>) {
        self.state.row_range = range;
        self.rebuild_view();
        self.emit();
    }

    /// Debounced: the new global filter text takes effect once typing
    /// pauses (drive via [`GridEngine::tick`]) or on
    /// [`GridEngine::apply_pending_filters`].
    pub fn set_global_filter(&mut self, text: &str) {
        self.global_debounce.submit(text.to_string());
    }

    /// Debounced, like [`GridEngine::set_global_filter`].
    pub fn set_column_filters(&mut self, filters: Vec<ColumnFilter>) {
        self.filter_debounce.submit(filters);
    }

    /// Apply pending filter input immediately.
    pub fn apply_pending_filters(&mut self) {
        let mut changed = false;
        if let Some(global) = self.global_debounce.flush() {
            self.state.global_filter = global;
            changed = true;
        }
        if let Some(filters) = self.filter_debounce.flush() {
            self.state.filters = filters;
            changed = true;
        }
        if changed {
            self.rebuild_view();
            self.emit();
        }
    }

    /// Replace the sort list. An empty list restores filtered order.
    pub fn apply_sorting(&mut self, sorts: Vec<SortSpec>) {
        self.state.sorts = sorts;
        self.rebuild_view();
        self.emit();
    }

    /// Drive debounce timers and the highlight sweep. Returns true if
    /// a pending filter was applied.
    pub fn tick(&mut self) -> bool {
        self.recent.sweep();
        let mut changed = false;
        if let Some(global) = self.global_debounce.take_ready() {
            self.state.global_filter = global;
            changed = true;
        }
        if let Some(filters) = self.filter_debounce.take_ready() {
            self.state.filters = filters;
            changed = true;
        }
        if changed {
            self.rebuild_view();
            self.emit();
        }
        changed
    }

    // ---- selection -------------------------------------------------

    pub fn select_rows(&mut self, ids: &[RowId]) {
        for &id in ids {
            if self.table.index_of(id).is_some() {
                self.selection.insert(id);
            }
        }
        self.emit();
    }

    /// Select the row at a position in the current view.
    pub fn select_view_row(&mut self, view_idx: usize) -> Result<()> {
        let base = self
            .view
            .base_index(view_idx)
            .ok_or(GridError::RowOutOfBounds(view_idx))?;
        if let Some(id) = self.table.row_id(base) {
            self.selection.insert(id);
        }
        self.emit();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.emit();
    }

    pub fn selection(&self) -> Vec<RowId> {
        self.selection.iter().copied().collect()
    }

    // ---- export ----------------------------------------------------

    pub fn export_csv(&self, selected_only: bool) -> Result<String> {
        let selected = self.selection_arg(selected_only);
        Exporter::to_csv(&self.table, &self.view, selected.as_deref())
    }

    pub fn export_json(&self, selected_only: bool) -> Result<String> {
        let selected = self.selection_arg(selected_only);
        Exporter::to_json(&self.table, &self.view, selected.as_deref())
    }

    pub fn write_csv_file(&self, dir: &Path, selected_only: bool) -> Result<PathBuf> {
        let selected = self.selection_arg(selected_only);
        Exporter::write_csv_file(&self.table, &self.view, selected.as_deref(), dir)
    }

    pub fn write_json_file(&self, dir: &Path, selected_only: bool) -> Result<PathBuf> {
        let selected = self.selection_arg(selected_only);
        Exporter::write_json_file(&self.table, &self.view, selected.as_deref(), dir)
    }

    fn selection_arg(&self, selected_only: bool) -> Option<Vec<RowId>> {
        selected_only.then(|| self.selection.iter().copied().collect())
    }

    // ---- windowing -------------------------------------------------

    /// Rows to materialize for the current view at a scroll position.
    pub fn row_window(&self, scroll_top: u64, viewport_height: u32) -> RowWindow {
        row_window(
            self.view.row_count(),
            self.config.display.row_height,
            scroll_top,
            viewport_height,
            self.config.behavior.overscan,
        )
    }

    /// Center columns to materialize at a horizontal scroll position.
    /// Pinned columns are not part of this window; they are always
    /// rendered.
    pub fn column_window(&self, scroll_left: u64, viewport_width: u32) -> ColumnWindow {
        column_window(
            &self.view.center_widths(&self.table),
            scroll_left,
            viewport_width,
            self.config.behavior.overscan,
        )
    }

    // ---- accessors -------------------------------------------------

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn view_state(&self) -> &ViewState {
        &self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_recent_edit(&self, row_id: RowId, column: usize) -> bool {
        self.recent.is_recent(row_id, column)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let rows = (0..self.view.row_count())
            .filter_map(|i| self.view.row_as_strings(&self.table, i))
            .collect();
        let name_of = |idx: &usize| self.table.columns[*idx].name.clone();
        GridSnapshot {
            headers: self.table.column_names(),
            visible_headers: self
                .view
                .visible_columns()
                .iter()
                .map(|&idx| self.table.columns[idx].name.clone())
                .collect(),
            rows,
            file_name: self.file_name.clone(),
            column_filters: self.state.filters.clone(),
            global_filter: self.state.global_filter.clone(),
            column_types: self
                .table
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.ctype))
                .collect(),
            sorting: self.state.sorts.clone(),
            pinned_left: self.view.left_pinned().iter().map(name_of).collect(),
            pinned_right: self.view.right_pinned().iter().map(name_of).collect(),
            hidden_columns: self
                .table
                .columns
                .iter()
                .filter(|c| !c.visible)
                .map(|c| c.name.clone())
                .collect(),
            selection: self.selection(),
            total_row_count: self.table.row_count(),
            visible_row_count: self.view.row_count(),
            column_count: self.table.column_count(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // ---- internals -------------------------------------------------

    fn commit(&mut self, action: EditAction) {
        if action.is_noop() {
            return;
        }
        self.recent.mark_all(action.touched_cells());
        self.history.record(action);
        self.rebuild_view();
        self.persist();
        self.emit();
    }

    fn rebuild_view(&mut self) {
        self.view = DataView::build(&self.table, &self.state);
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            let snapshot = SessionSnapshot::from_table(&self.table, self.file_name.as_deref());
            if let Err(e) = store.save(&snapshot) {
                warn!("Failed to persist session: {}", e);
            }
        }
    }

    fn emit(&self) {
        if let Some(callback) = &self.on_change {
            callback(&self.snapshot());
        }
    }

    /// Base indices of selected rows, ascending.
    fn selected_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .selection
            .iter()
            .filter_map(|&id| self.table.index_of(id))
            .collect();
        indices.sort_unstable();
        indices
    }

    fn prune_selection(&mut self) {
        let table = &self.table;
        self.selection.retain(|&id| table.index_of(id).is_some());
    }
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterOp;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_with(text: &str) -> GridEngine {
        let mut engine = GridEngine::default();
        engine.load_from_text(text, "test.csv").unwrap();
        engine
    }

    const PEOPLE: &str = "name,age\nAlice,30\nBob,25";

    #[test]
    fn test_load_infers_types() {
        let engine = engine_with(PEOPLE);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.headers, vec!["name", "age"]);
        assert_eq!(
            snapshot.column_types[1],
            ("age".to_string(), ColumnType::Number)
        );
        assert_eq!(snapshot.total_row_count, 2);
    }

    #[test]
    fn test_sort_by_age_asc() {
        let mut engine = engine_with(PEOPLE);
        engine.apply_sorting(vec![SortSpec::asc("age")]);
        let rows = engine.snapshot().rows;
        assert_eq!(rows[0][0], "Bob");
        assert_eq!(rows[1][0], "Alice");
    }

    #[test]
    fn test_filter_contains_case_insensitive() {
        let mut engine = engine_with(PEOPLE);
        engine.set_column_filters(vec![ColumnFilter::new("name", FilterOp::Contains, "b")]);
        engine.apply_pending_filters();
        let rows = engine.snapshot().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Bob");
    }

    #[test]
    fn test_edit_undo_restores_value_and_history() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        engine.set_cell(alice, "age", "31").unwrap();
        assert_eq!(engine.table().get_value(0, 1), Some("31"));
        assert!(engine.is_recent_edit(alice, 1));

        assert!(engine.undo().unwrap());
        assert_eq!(engine.table().get_value(0, 1), Some("30"));
        assert_eq!(engine.history().past_len(), 0);
    }

    #[test]
    fn test_noop_edit_creates_no_history() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        engine.set_cell(alice, "age", "30").unwrap();
        assert!(!engine.history().can_undo());
    }

    #[test]
    fn test_duplicate_selected_appends_copy() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        engine.select_rows(&[alice]);
        let added = engine.duplicate_selected_rows().unwrap();
        assert_eq!(added, 1);
        assert_eq!(engine.table().row_count(), 3);
        assert_eq!(engine.table().get_value(2, 0), Some("Alice"));
    }

    #[test]
    fn test_export_selected_empty_is_error() {
        let engine = engine_with(PEOPLE);
        assert!(matches!(
            engine.export_csv(true),
            Err(GridError::NoSelection)
        ));
    }

    #[test]
    fn test_empty_global_filter_passes_all() {
        let mut engine = engine_with(PEOPLE);
        engine.set_global_filter("");
        engine.apply_pending_filters();
        assert_eq!(engine.snapshot().visible_row_count, 2);
    }

    #[test]
    fn test_delete_undo_round_trip() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        engine.select_rows(&[alice]);
        engine.delete_selected_rows().unwrap();
        assert_eq!(engine.table().row_count(), 1);
        assert!(engine.selection().is_empty());

        engine.undo().unwrap();
        assert_eq!(engine.table().row_count(), 2);
        assert_eq!(engine.table().get_value(0, 0), Some("Alice"));

        engine.redo().unwrap();
        assert_eq!(engine.table().row_count(), 1);
        assert_eq!(engine.table().get_value(0, 0), Some("Bob"));
    }

    #[test]
    fn test_edit_through_filtered_view_targets_right_row() {
        let mut engine = engine_with(PEOPLE);
        engine.set_column_filters(vec![ColumnFilter::new("name", FilterOp::Contains, "b")]);
        engine.apply_pending_filters();
        // View row 0 is Bob; resolve through the view to a stable id
        let base = engine.view().base_index(0).unwrap();
        let bob = engine.table().row_id(base).unwrap();
        engine.set_cell(bob, "age", "26").unwrap();
        // Base row 1 (Bob) changed, base row 0 (Alice) untouched
        assert_eq!(engine.table().get_value(1, 1), Some("26"));
        assert_eq!(engine.table().get_value(0, 1), Some("30"));
    }

    #[test]
    fn test_search_replace_and_undo() {
        let mut engine = engine_with("city\nBerlin\nBern\nBoston");
        let changed = engine.search_replace("Ber", "Mun", None).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(engine.table().get_value(0, 0), Some("Munlin"));
        engine.undo().unwrap();
        assert_eq!(engine.table().get_value(0, 0), Some("Berlin"));
        assert_eq!(engine.table().get_value(1, 0), Some("Bern"));
    }

    #[test]
    fn test_set_column_values_selected_only() {
        let mut engine = engine_with(PEOPLE);
        let bob = engine.table().row_id(1).unwrap();
        engine.select_rows(&[bob]);
        let changed = engine.set_column_values("age", "40", true).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(engine.table().get_value(0, 1), Some("30"));
        assert_eq!(engine.table().get_value(1, 1), Some("40"));
    }

    #[test]
    fn test_add_new_rows_undoable() {
        let mut engine = engine_with(PEOPLE);
        engine.add_new_rows(3).unwrap();
        assert_eq!(engine.table().row_count(), 5);
        assert_eq!(engine.table().get_value(4, 0), Some(""));
        engine.undo().unwrap();
        assert_eq!(engine.table().row_count(), 2);
    }

    #[test]
    fn test_add_rows_without_data_is_error() {
        let mut engine = GridEngine::default();
        assert!(matches!(
            engine.add_new_rows(2),
            Err(GridError::EmptyInput)
        ));
    }

    #[test]
    fn test_toggle_and_pin_columns() {
        let mut engine = engine_with(PEOPLE);
        engine.toggle_column("age", Some(false)).unwrap();
        assert_eq!(engine.snapshot().visible_headers, vec!["name"]);
        engine.toggle_column("age", None).unwrap();
        engine.pin_column("age", PinSide::Left).unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.pinned_left, vec!["age"]);
        assert_eq!(snapshot.visible_headers, vec!["age", "name"]);
    }

    #[test]
    fn test_row_range_stacks_with_filters() {
        let mut engine = engine_with("v\n1\n2\n3\n4\n5");
        engine.set_row_range(Some(RowRange::new(2, 4)));
        assert_eq!(engine.snapshot().visible_row_count, 3);
        engine.set_column_filters(vec![ColumnFilter::new("v", FilterOp::NotContains, "3")]);
        engine.apply_pending_filters();
        assert_eq!(engine.snapshot().visible_row_count, 2);
    }

    #[test]
    fn test_callback_fires_on_change() {
        let mut engine = engine_with(PEOPLE);
        let count = Rc::new(RefCell::new(0usize));
        let seen = count.clone();
        engine.on_change(move |snapshot| {
            *seen.borrow_mut() += 1;
            assert_eq!(snapshot.headers.len(), 2);
        });
        let before = *count.borrow();
        engine.apply_sorting(vec![SortSpec::asc("age")]);
        assert!(*count.borrow() > before);
    }

    #[test]
    fn test_clear_data_resets_everything() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        engine.set_cell(alice, "age", "31").unwrap();
        engine.clear_data();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.total_row_count, 0);
        assert!(snapshot.headers.is_empty());
        assert!(!snapshot.can_undo);
        assert!(snapshot.file_name.is_none());
    }

    #[test]
    fn test_undo_redo_inverse_law() {
        let mut engine = engine_with(PEOPLE);
        let alice = engine.table().row_id(0).unwrap();
        let bob = engine.table().row_id(1).unwrap();
        let before: Vec<Vec<String>> = engine
            .table()
            .rows()
            .iter()
            .map(|r| r.values.clone())
            .collect();

        engine.set_cell(alice, "age", "31").unwrap();
        engine.set_cell(bob, "name", "Robert").unwrap();
        engine.select_rows(&[bob]);
        engine.duplicate_selected_rows().unwrap();

        let after: Vec<Vec<String>> = engine
            .table()
            .rows()
            .iter()
            .map(|r| r.values.clone())
            .collect();

        for _ in 0..3 {
            assert!(engine.undo().unwrap());
        }
        let restored: Vec<Vec<String>> = engine
            .table()
            .rows()
            .iter()
            .map(|r| r.values.clone())
            .collect();
        assert_eq!(restored, before);

        for _ in 0..3 {
            assert!(engine.redo().unwrap());
        }
        let replayed: Vec<Vec<String>> = engine
            .table()
            .rows()
            .iter()
            .map(|r| r.values.clone())
            .collect();
        assert_eq!(replayed, after);
    }
}
