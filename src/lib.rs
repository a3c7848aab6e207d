//! In-memory tabular data grid engine.
//!
//! Parses CSV text (files or clipboard), infers column types, and
//! maintains a derived view (filters, sorts, row range, pinning,
//! visibility) over an editable table with bounded undo/redo. The
//! [`engine::GridEngine`] facade ties it together and notifies a host
//! callback after every state change; [`viewport`] computes the
//! row/column windows a virtualized renderer needs.

pub mod config;
pub mod data;
pub mod debouncer;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod viewport;

pub use config::Config;
pub use data::data_view::{DataView, RowRange, ViewState};
pub use data::datatable::{ColumnType, DataColumn, DataRow, DataTable, PinSide, RowId};
pub use data::filter::{ColumnFilter, FilterOp};
pub use data::sort::{SortDirection, SortSpec};
pub use engine::{GridEngine, GridSnapshot};
pub use error::{GridError, Result};
