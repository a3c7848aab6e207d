//! Heuristic column type classification.
//!
//! Samples each column's values and picks the most specific type that
//! covers at least 80% of the sample. Classification is best-effort
//! and display-only: it never causes data to be rejected.

use regex::Regex;
use std::sync::LazyLock;

use crate::data::datatable::{ColumnType, DataTable};

/// Fraction of sampled values that must match for a type to win.
const MATCH_THRESHOLD: f64 = 0.8;

static BOOLEAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(true|false|yes|no|1|0)$").unwrap());

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Strict date patterns, paired with the chrono format used to verify
/// the value is a real calendar date. The regex gate keeps ID strings
/// like "BQ-81198596" or "ORDER-2024-001" out of the date bucket; the
/// parse step rejects impossible dates like 2024-02-31.
static DATE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(),
            "%Y-%m-%d",
        ),
        (
            Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap(),
            "%m/%d/%Y",
        ),
        (
            Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap(),
            "%d-%m-%Y",
        ),
        (
            Regex::new(r"^\d{4}/\d{2}/\d{2}$").unwrap(),
            "%Y/%m/%d",
        ),
        (
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").unwrap(),
            "%Y-%m-%dT%H:%M:%S",
        ),
    ]
});

/// Type inference over sampled column values
pub struct TypeInference;

impl TypeInference {
    /// Classify a column from its values.
    ///
    /// Up to `sample_size` non-empty values are examined. Checks run
    /// in priority order; the first type clearing the 80% threshold
    /// wins, and text is the fallback. Deterministic for a fixed
    /// column.
    pub fn infer_column<'a, I>(values: I, sample_size: usize) -> ColumnType
    where
        I: Iterator<Item = &'a str>,
    {
        let sample: Vec<&str> = values
            .filter(|v| !v.trim().is_empty())
            .take(sample_size)
            .collect();

        if sample.is_empty() {
            return ColumnType::Text;
        }

        if Self::fraction_matching(&sample, Self::is_boolean) >= MATCH_THRESHOLD {
            return ColumnType::Boolean;
        }
        if Self::fraction_matching(&sample, Self::is_url) >= MATCH_THRESHOLD {
            return ColumnType::Url;
        }
        if Self::fraction_matching(&sample, Self::is_email) >= MATCH_THRESHOLD {
            return ColumnType::Email;
        }
        if Self::fraction_matching(&sample, Self::is_number) >= MATCH_THRESHOLD {
            return ColumnType::Number;
        }
        if Self::fraction_matching(&sample, Self::is_date) >= MATCH_THRESHOLD {
            return ColumnType::Date;
        }

        ColumnType::Text
    }

    /// Re-infer every column of a table in place.
    pub fn infer_table(table: &mut DataTable, sample_size: usize) {
        let types: Vec<ColumnType> = (0..table.column_count())
            .map(|col_idx| {
                Self::infer_column(
                    table
                        .rows()
                        .iter()
                        .filter_map(move |row| row.get(col_idx)),
                    sample_size,
                )
            })
            .collect();
        for (column, ctype) in table.columns.iter_mut().zip(types) {
            column.ctype = ctype;
        }
    }

    fn fraction_matching(sample: &[&str], predicate: fn(&str) -> bool) -> f64 {
        let hits = sample.iter().filter(|v| predicate(v.trim())).count();
        hits as f64 / sample.len() as f64
    }

    pub fn is_boolean(value: &str) -> bool {
        BOOLEAN_PATTERN.is_match(value)
    }

    pub fn is_url(value: &str) -> bool {
        URL_PATTERN.is_match(value)
    }

    pub fn is_email(value: &str) -> bool {
        EMAIL_PATTERN.is_match(value)
    }

    /// Parses as a float after stripping thousands separators.
    pub fn is_number(value: &str) -> bool {
        let cleaned = value.replace(',', "");
        !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
    }

    /// Matches a known date shape and survives a real calendar parse.
    pub fn is_date(value: &str) -> bool {
        for (pattern, format) in DATE_PATTERNS.iter() {
            if pattern.is_match(value) {
                let parseable = if format.contains("%H") {
                    // Timestamp patterns may carry trailing zone info;
                    // validate just the date-time prefix.
                    chrono::NaiveDateTime::parse_from_str(&value[..19.min(value.len())], format)
                        .is_ok()
                } else {
                    chrono::NaiveDate::parse_from_str(value, format).is_ok()
                };
                if parseable {
                    return true;
                }
            }
        }
        false
    }
}
