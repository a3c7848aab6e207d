use serde::{Deserialize, Serialize};

use crate::data::datatable::DataTable;

/// Per-column filter operator. Text operators compare
/// case-insensitively on the cell's string representation;
/// `IsEmpty`/`IsNotEmpty` ignore the filter value entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    NotContains,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Contains => "contains",
            FilterOp::Equals => "equals",
            FilterOp::StartsWith => "startsWith",
            FilterOp::EndsWith => "endsWith",
            FilterOp::NotContains => "notContains",
            FilterOp::IsEmpty => "isEmpty",
            FilterOp::IsNotEmpty => "isNotEmpty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" => Some(FilterOp::Contains),
            "equals" | "eq" | "=" => Some(FilterOp::Equals),
            "startswith" | "starts" => Some(FilterOp::StartsWith),
            "endswith" | "ends" => Some(FilterOp::EndsWith),
            "notcontains" | "not" => Some(FilterOp::NotContains),
            "isempty" | "empty" => Some(FilterOp::IsEmpty),
            "isnotempty" | "notempty" => Some(FilterOp::IsNotEmpty),
            _ => None,
        }
    }

    /// Evaluate this operator against one cell.
    pub fn matches(&self, cell: &str, value: &str) -> bool {
        match self {
            FilterOp::IsEmpty => cell.trim().is_empty(),
            FilterOp::IsNotEmpty => !cell.trim().is_empty(),
            _ => {
                let cell = cell.to_lowercase();
                let value = value.to_lowercase();
                match self {
                    FilterOp::Contains => cell.contains(&value),
                    FilterOp::Equals => cell == value,
                    FilterOp::StartsWith => cell.starts_with(&value),
                    FilterOp::EndsWith => cell.ends_with(&value),
                    FilterOp::NotContains => !cell.contains(&value),
                    FilterOp::IsEmpty | FilterOp::IsNotEmpty => unreachable!(),
                }
            }
        }
    }
}

/// One per-column predicate. Multiple filters are ANDed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }
}

/// Pure filter evaluation over base-row index lists.
///
/// Non-mutating and idempotent: re-applying an identical filter set to
/// its own output yields the same indices.
pub struct FilterEngine;

impl FilterEngine {
    /// Keep the candidate rows passing all column filters AND the
    /// global filter. Filters naming unknown columns are skipped.
    pub fn apply(
        table: &DataTable,
        candidates: &[usize],
        filters: &[ColumnFilter],
        global_filter: &str,
    ) -> Vec<usize> {
        // Resolve names once, outside the row loop
        let resolved: Vec<(usize, &ColumnFilter)> = filters
            .iter()
            .filter_map(|f| table.column_index(&f.column).map(|idx| (idx, f)))
            .collect();

        let global = global_filter.trim().to_lowercase();
        let visible_cols: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.visible)
            .map(|(idx, _)| idx)
            .collect();

        candidates
            .iter()
            .copied()
            .filter(|&row_idx| {
                Self::passes_column_filters(table, row_idx, &resolved)
                    && Self::passes_global(table, row_idx, &global, &visible_cols)
            })
            .collect()
    }

    fn passes_column_filters(
        table: &DataTable,
        row_idx: usize,
        resolved: &[(usize, &ColumnFilter)],
    ) -> bool {
        resolved.iter().all(|&(col_idx, filter)| {
            let cell = table.get_value(row_idx, col_idx).unwrap_or("");
            filter.op.matches(cell, &filter.value)
        })
    }

    /// Row passes if any visible column's string form contains the
    /// query. An empty query passes every row.
    fn passes_global(
        table: &DataTable,
        row_idx: usize,
        global: &str,
        visible_cols: &[usize],
    ) -> bool {
        if global.is_empty() {
            return true;
        }
        visible_cols.iter().any(|&col_idx| {
            table
                .get_value(row_idx, col_idx)
                .map(|cell| cell.to_lowercase().contains(global))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataRow, DataTable};

    fn sample_table() -> DataTable {
        DataTable::from_parts(
            "test",
            vec!["name".to_string(), "age".to_string(), "city".to_string()],
            vec![
                DataRow::new(vec!["Alice".into(), "30".into(), "Berlin".into()]),
                DataRow::new(vec!["Bob".into(), "25".into(), "".into()]),
                DataRow::new(vec!["Carol".into(), "35".into(), "Boston".into()]),
            ],
        )
    }

    fn all_rows(table: &DataTable) -> Vec<usize> {
        (0..table.row_count()).collect()
    }

    #[test]
    fn test_contains_case_insensitive() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("name", FilterOp::Contains, "b")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![1]); // only Bob
    }

    #[test]
    fn test_filters_are_anded() {
        let table = sample_table();
        let filters = vec![
            ColumnFilter::new("city", FilterOp::StartsWith, "b"),
            ColumnFilter::new("age", FilterOp::Equals, "35"),
        ];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_is_empty_ignores_value() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("city", FilterOp::IsEmpty, "ignored")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![1]);

        let filters = vec![ColumnFilter::new("city", FilterOp::IsNotEmpty, "")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![0, 2]);
    }

    #[test]
    fn test_not_contains() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("name", FilterOp::NotContains, "o")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![0]); // Bob and Carol both contain 'o'
    }

    #[test]
    fn test_global_filter_or_across_columns() {
        let table = sample_table();
        let result = FilterEngine::apply(&table, &all_rows(&table), &[], "bos");
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_empty_global_passes_all() {
        let table = sample_table();
        let result = FilterEngine::apply(&table, &all_rows(&table), &[], "");
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[test]
    fn test_global_skips_hidden_columns() {
        let mut table = sample_table();
        table.column_mut("city").unwrap().visible = false;
        let result = FilterEngine::apply(&table, &all_rows(&table), &[], "berlin");
        assert!(result.is_empty());
    }

    #[test]
    fn test_global_anded_with_column_filters() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("name", FilterOp::Contains, "o")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "boston");
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_unknown_column_filter_skipped() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("missing", FilterOp::Equals, "x")];
        let result = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[test]
    fn test_idempotent() {
        let table = sample_table();
        let filters = vec![ColumnFilter::new("name", FilterOp::Contains, "a")];
        let once = FilterEngine::apply(&table, &all_rows(&table), &filters, "");
        let twice = FilterEngine::apply(&table, &once, &filters, "");
        assert_eq!(once, twice);
    }
}
