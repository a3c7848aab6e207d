use thiserror::Error;

/// Error taxonomy for the grid engine.
///
/// Every variant is recoverable: operations either complete fully or
/// return one of these and leave the engine state untouched. The host
/// is expected to surface the message as a transient notification.
#[derive(Debug, Error)]
pub enum GridError {
    /// Input text contained no non-empty lines.
    #[error("input contains no data")]
    EmptyInput,

    /// Input could not be tokenized into rows.
    #[error("failed to parse input: {0}")]
    Parse(String),

    /// Clipboard access was denied or the clipboard was empty.
    #[error("could not read clipboard: {0}")]
    ClipboardRead(String),

    /// An operation restricted to selected rows was issued with no
    /// rows selected.
    #[error("no rows selected")]
    NoSelection,

    /// A column name that does not exist in the loaded table.
    #[error("unknown column: {0}")]
    ColumnNotFound(String),

    /// A row index outside the current table.
    #[error("row {0} is out of bounds")]
    RowOutOfBounds(usize),

    /// A stable row id whose row no longer exists.
    #[error("row id {0} no longer exists")]
    RowMissing(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
