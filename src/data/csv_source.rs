use std::fs;
use std::path::Path;
use tracing::debug;

use crate::data::datatable::DataRow;
use crate::error::{GridError, Result};

/// Parsed delimited text: a header row plus data rows.
#[derive(Debug, Clone)]
pub struct ParsedData {
    pub headers: Vec<String>,
    pub rows: Vec<DataRow>,
}

/// Tokenizes delimited text (files or clipboard pastes) into headers
/// and rows. Quoted fields with embedded delimiters/newlines and `""`
/// escapes are honored; malformed rows are repaired rather than
/// rejected (short rows pad, long rows truncate, stray quotes stay
/// literal).
pub struct CsvSource;

impl CsvSource {
    /// Parse delimited text. The first non-empty line is the header
    /// row. Returns [`GridError::EmptyInput`] when no non-empty lines
    /// exist.
    pub fn parse_text(text: &str) -> Result<ParsedData> {
        let trimmed = text.trim_start_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return Err(GridError::EmptyInput);
        }

        let delimiter = Self::sniff_delimiter(trimmed);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(trimmed.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| GridError::Parse(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(GridError::EmptyInput);
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    // Lenient mode: skip the unreadable record, keep going
                    debug!("Skipping malformed record: {}", e);
                    continue;
                }
            };
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let values: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            rows.push(DataRow::new(values).conform(width));
        }

        debug!(
            "Parsed {} data rows across {} columns (delimiter {:?})",
            rows.len(),
            width,
            delimiter as char
        );

        Ok(ParsedData { headers, rows })
    }

    /// Load and parse a `.csv` file. Returns the file name (for
    /// display and session persistence) alongside the parsed data.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<(String, ParsedData)> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let parsed = Self::parse_text(&text)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok((file_name, parsed))
    }

    /// Clipboard pastes from spreadsheets arrive tab-separated; prefer
    /// tab when the header line carries tabs and no commas.
    fn sniff_delimiter(text: &str) -> u8 {
        let first_line = text.lines().next().unwrap_or("");
        if first_line.contains('\t') && !first_line.contains(',') {
            b'\t'
        } else {
            b','
        }
    }
}
