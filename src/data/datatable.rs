use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::error::{GridError, Result};

/// Stable identifier issued to every row at ingestion.
///
/// Rows live in a dense array and views address them by position, but
/// mutations and selection resolve through ids so an edit computed
/// against a filtered/sorted view cannot land on the wrong base row.
pub type RowId = u64;

/// Inferred data type of a column. Display-only: it drives formatting
/// and numeric statistics, never validation or rejection of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Boolean,
    Url,
    Email,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
            ColumnType::Url => "url",
            ColumnType::Email => "email",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Number)
    }

    /// Format a raw cell for display according to the column type.
    pub fn format_cell(&self, raw: &str) -> String {
        match self {
            ColumnType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => "true".to_string(),
                "false" | "no" | "0" => "false".to_string(),
                _ => raw.to_string(),
            },
            ColumnType::Number => {
                let cleaned = raw.replace(',', "");
                match cleaned.parse::<f64>() {
                    Ok(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                        format!("{}", n as i64)
                    }
                    Ok(_) => cleaned,
                    Err(_) => raw.to_string(),
                }
            }
            _ => raw.to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which edge of the scrollable region a column is fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    None,
    Left,
    Right,
}

/// Column metadata. Identity is the case-sensitive header name;
/// renaming is not supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub ctype: ColumnType,
    pub visible: bool,
    pub pin: PinSide,
    /// Pixel widths used by the windower
    pub width: u32,
    pub min_width: u32,
    pub max_width: u32,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ctype: ColumnType::Text,
            visible: true,
            pin: PinSide::None,
            width: 150,
            min_width: 50,
            max_width: 500,
        }
    }

    pub fn with_type(mut self, ctype: ColumnType) -> Self {
        self.ctype = ctype;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }
}

/// A row of cells. Cells are stored as strings; the empty string is
/// the null representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<String>,
}

impl DataRow {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn blank(width: usize) -> Self {
        Self {
            values: vec![String::new(); width],
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pad with empty strings or drop extra fields so the row matches
    /// the column count. Lenient CSV repair.
    pub fn conform(mut self, width: usize) -> Self {
        self.values.resize(width, String::new());
        self
    }
}

/// Dense in-memory table: ordered columns, ordered rows, and a stable
/// id per row (arena + id map pattern).
#[derive(Debug, Clone)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    rows: Vec<DataRow>,
    row_ids: Vec<RowId>,
    index_map: HashMap<RowId, usize>,
    next_row_id: RowId,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_ids: Vec::new(),
            index_map: HashMap::new(),
            next_row_id: 1,
        }
    }

    /// Build a table from parsed headers and rows. Rows are conformed
    /// to the header width and issued ids in order.
    pub fn from_parts(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<DataRow>,
    ) -> Self {
        let mut table = Self::new(name);
        for header in headers {
            table.columns.push(DataColumn::new(header));
        }
        let width = table.columns.len();
        for row in rows {
            table.push_row(row.conform(width));
        }
        debug!(
            "Built table '{}' with {} columns, {} rows",
            table.name,
            table.column_count(),
            table.row_count()
        );
        table
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut DataColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn get_value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)
    }

    /// Overwrite a single cell, returning the previous value.
    pub fn set_value(&mut self, row: usize, col: usize, value: String) -> Result<String> {
        if col >= self.columns.len() {
            return Err(GridError::ColumnNotFound(format!("#{}", col)));
        }
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.values.get_mut(col))
            .ok_or(GridError::RowOutOfBounds(row))?;
        Ok(std::mem::replace(cell, value))
    }

    /// Stable id of the row at a base index.
    pub fn row_id(&self, index: usize) -> Option<RowId> {
        self.row_ids.get(index).copied()
    }

    /// Current base index of a row id, if the row still exists.
    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.index_map.get(&id).copied()
    }

    /// Append a row, issuing a fresh id.
    pub fn push_row(&mut self, row: DataRow) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.index_map.insert(id, self.rows.len());
        self.rows.push(row.conform(self.columns.len()));
        self.row_ids.push(id);
        id
    }

    /// Insert a row at a position, issuing a fresh id.
    pub fn insert_row(&mut self, at: usize, row: DataRow) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.insert_row_with_id(at, row, id);
        id
    }

    /// Insert a row reusing a previously issued id. Used by undo/redo
    /// so a delete-then-undo round trip preserves identity.
    pub fn insert_row_with_id(&mut self, at: usize, row: DataRow, id: RowId) {
        let at = at.min(self.rows.len());
        self.rows.insert(at, row.conform(self.columns.len()));
        self.row_ids.insert(at, id);
        if id >= self.next_row_id {
            self.next_row_id = id + 1;
        }
        self.rebuild_index_map();
    }

    /// Remove the row at a base index, returning its id and contents.
    pub fn remove_row(&mut self, at: usize) -> Option<(RowId, DataRow)> {
        if at >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(at);
        let id = self.row_ids.remove(at);
        self.rebuild_index_map();
        Some((id, row))
    }

    fn rebuild_index_map(&mut self) {
        self.index_map = self
            .row_ids
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
    }

    /// All cell strings of a row, in column order.
    pub fn row_as_strings(&self, index: usize) -> Option<Vec<String>> {
        self.rows.get(index).map(|r| r.values.clone())
    }

    /// Column names currently marked visible, in declaration order.
    pub fn visible_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn estimate_memory_size(&self) -> usize {
        let mut size = std::mem::size_of::<Self>();
        size += self.columns.len() * std::mem::size_of::<DataColumn>();
        for col in &self.columns {
            size += col.name.len();
        }
        size += self.rows.len() * (std::mem::size_of::<DataRow>() + std::mem::size_of::<RowId>());
        for row in &self.rows {
            for value in &row.values {
                size += std::mem::size_of::<String>() + value.len();
            }
        }
        size
    }
}
