use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::data::datatable::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// One sort key. Earlier entries in a sort list take priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Stable multi-key ordering of base-row index lists.
pub struct SortEngine;

impl SortEngine {
    /// Sort the given row indices by the sort list. Comparison is on
    /// the cell's string representation; ties fall through to the next
    /// key and finally keep their incoming relative order (the sort is
    /// stable, so clearing all keys restores the pre-sort sequence).
    pub fn apply(table: &DataTable, mut rows: Vec<usize>, sorts: &[SortSpec]) -> Vec<usize> {
        let resolved: Vec<(usize, SortDirection)> = sorts
            .iter()
            .filter_map(|s| {
                table
                    .column_index(&s.column)
                    .map(|idx| (idx, s.direction))
            })
            .collect();

        if resolved.is_empty() {
            return rows;
        }

        rows.sort_by(|&a, &b| {
            for &(col_idx, direction) in &resolved {
                let va = table.get_value(a, col_idx).unwrap_or("");
                let vb = table.get_value(b, col_idx).unwrap_or("");
                let cmp = va.cmp(vb);
                if cmp != Ordering::Equal {
                    return match direction {
                        SortDirection::Asc => cmp,
                        SortDirection::Desc => cmp.reverse(),
                    };
                }
            }
            Ordering::Equal
        });
        rows
    }
}
