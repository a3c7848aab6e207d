use chrono::Local;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::data::data_view::DataView;
use crate::data::datatable::{DataTable, RowId};
use crate::error::{GridError, Result};

/// Serializes the current filtered/sorted/visibility-applied view to
/// CSV or JSON, optionally restricted to selected rows.
pub struct Exporter;

impl Exporter {
    /// CSV text of the view. Every field is double-quoted, with `"`
    /// escaped as `""`. Row order and column order are the view's.
    pub fn to_csv(
        table: &DataTable,
        view: &DataView,
        selected: Option<&[RowId]>,
    ) -> Result<String> {
        let columns = view.visible_columns();
        let header_names: Vec<String> = columns
            .iter()
            .filter_map(|&idx| table.columns.get(idx))
            .map(|c| c.name.clone())
            .collect();

        let mut out = String::new();
        out.push_str(&Self::csv_line(header_names.iter().map(|s| s.as_str())));

        for base_idx in Self::export_rows(table, view, selected)? {
            let fields: Vec<&str> = columns
                .iter()
                .map(|&col| table.get_value(base_idx, col).unwrap_or(""))
                .collect();
            out.push_str(&Self::csv_line(fields.into_iter()));
        }
        Ok(out)
    }

    /// JSON text of the view: an array of objects keyed by visible
    /// column name.
    pub fn to_json(
        table: &DataTable,
        view: &DataView,
        selected: Option<&[RowId]>,
    ) -> Result<String> {
        let columns = view.visible_columns();
        let mut array = Vec::new();

        for base_idx in Self::export_rows(table, view, selected)? {
            let mut obj = Map::new();
            for &col in &columns {
                let name = match table.columns.get(col) {
                    Some(c) => c.name.clone(),
                    None => continue,
                };
                let cell = table.get_value(base_idx, col).unwrap_or("");
                obj.insert(name, Value::String(cell.to_string()));
            }
            array.push(Value::Object(obj));
        }

        serde_json::to_string_pretty(&array).map_err(|e| GridError::Parse(e.to_string()))
    }

    /// Write CSV to a timestamped file in `dir`, returning its path.
    pub fn write_csv_file(
        table: &DataTable,
        view: &DataView,
        selected: Option<&[RowId]>,
        dir: &std::path::Path,
    ) -> Result<PathBuf> {
        let text = Self::to_csv(table, view, selected)?;
        let path = dir.join(format!(
            "export_{}.csv",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&path, text)?;
        info!("Exported CSV to {:?}", path);
        Ok(path)
    }

    /// Write JSON to a timestamped file in `dir`, returning its path.
    pub fn write_json_file(
        table: &DataTable,
        view: &DataView,
        selected: Option<&[RowId]>,
        dir: &std::path::Path,
    ) -> Result<PathBuf> {
        let text = Self::to_json(table, view, selected)?;
        let path = dir.join(format!(
            "export_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        fs::write(&path, text)?;
        info!("Exported JSON to {:?}", path);
        Ok(path)
    }

    /// View rows to export, in view order. With a selection, only
    /// selected rows are kept; an empty selection is an error rather
    /// than an empty file.
    fn export_rows(
        table: &DataTable,
        view: &DataView,
        selected: Option<&[RowId]>,
    ) -> Result<Vec<usize>> {
        match selected {
            None => Ok(view.row_indices().to_vec()),
            Some(ids) => {
                if ids.is_empty() {
                    return Err(GridError::NoSelection);
                }
                let rows: Vec<usize> = view
                    .row_indices()
                    .iter()
                    .copied()
                    .filter(|&base_idx| {
                        table
                            .row_id(base_idx)
                            .map(|id| ids.contains(&id))
                            .unwrap_or(false)
                    })
                    .collect();
                if rows.is_empty() {
                    return Err(GridError::NoSelection);
                }
                Ok(rows)
            }
        }
    }

    fn csv_line<'a, I: Iterator<Item = &'a str>>(fields: I) -> String {
        let quoted: Vec<String> = fields
            .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
            .collect();
        let mut line = quoted.join(",");
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_view::ViewState;
    use crate::data::datatable::{DataRow, DataTable};
    use crate::data::filter::{ColumnFilter, FilterOp};

    fn sample() -> (DataTable, DataView) {
        let table = DataTable::from_parts(
            "test",
            vec!["name".to_string(), "age".to_string()],
            vec![
                DataRow::new(vec!["Alice".into(), "30".into()]),
                DataRow::new(vec!["Bob".into(), "25".into()]),
            ],
        );
        let view = DataView::build(&table, &ViewState::default());
        (table, view)
    }

    #[test]
    fn test_csv_always_quotes() {
        let (table, view) = sample();
        let csv = Exporter::to_csv(&table, &view, None).unwrap();
        assert_eq!(csv, "\"name\",\"age\"\n\"Alice\",\"30\"\n\"Bob\",\"25\"\n");
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let table = DataTable::from_parts(
            "t",
            vec!["q".to_string()],
            vec![DataRow::new(vec!["say \"hi\"".into()])],
        );
        let view = DataView::build(&table, &ViewState::default());
        let csv = Exporter::to_csv(&table, &view, None).unwrap();
        assert_eq!(csv, "\"q\"\n\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_csv_respects_view_filter_and_visibility() {
        let (mut table, _) = sample();
        table.column_mut("age").unwrap().visible = false;
        let state = ViewState {
            filters: vec![ColumnFilter::new("name", FilterOp::Contains, "b")],
            ..Default::default()
        };
        let view = DataView::build(&table, &state);
        let csv = Exporter::to_csv(&table, &view, None).unwrap();
        assert_eq!(csv, "\"name\"\n\"Bob\"\n");
    }

    #[test]
    fn test_json_keys_are_visible_columns() {
        let (table, view) = sample();
        let json = Exporter::to_json(&table, &view, None).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "Alice");
        assert_eq!(parsed[1]["age"], "25");
    }

    #[test]
    fn test_selected_only() {
        let (table, view) = sample();
        let bob = table.row_id(1).unwrap();
        let csv = Exporter::to_csv(&table, &view, Some(&[bob])).unwrap();
        assert_eq!(csv, "\"name\",\"age\"\n\"Bob\",\"25\"\n");
    }

    #[test]
    fn test_empty_selection_is_error() {
        let (table, view) = sample();
        assert!(matches!(
            Exporter::to_csv(&table, &view, Some(&[])),
            Err(GridError::NoSelection)
        ));
        assert!(matches!(
            Exporter::to_json(&table, &view, Some(&[])),
            Err(GridError::NoSelection)
        ));
    }
}
