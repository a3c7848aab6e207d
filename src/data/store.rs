use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::data::datatable::{DataRow, DataTable};
use crate::error::Result;

/// Key under which the session snapshot is stored. One slot: loading
/// new data replaces the previous snapshot.
const SESSION_KEY: &str = "session";

/// The persisted shape: just the raw grid content. Derived state
/// (filters, sorts, types) is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub file_name: Option<String>,
}

impl SessionSnapshot {
    pub fn from_table(table: &DataTable, file_name: Option<&str>) -> Self {
        Self {
            headers: table.column_names(),
            rows: table.rows().iter().map(|r| r.values.clone()).collect(),
            file_name: file_name.map(|s| s.to_string()),
        }
    }

    pub fn into_table(self) -> (DataTable, Option<String>) {
        let rows = self.rows.into_iter().map(DataRow::new).collect();
        let name = self
            .file_name
            .clone()
            .unwrap_or_else(|| "session".to_string());
        (
            DataTable::from_parts(name, self.headers, rows),
            self.file_name,
        )
    }
}

/// Best-effort single-key persistence of the grid content across
/// sessions. Missing or corrupt data loads as "no data"; save
/// failures are logged, never fatal.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store in the platform data dir. `None` when the platform has
    /// no data dir (persistence is then disabled).
    pub fn open_default() -> Option<Self> {
        dirs::data_dir().map(|d| Self::open(d.join("tabgrid")))
    }

    pub fn open(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn slot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", SESSION_KEY))
    }

    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(snapshot)
            .map_err(|e| crate::error::GridError::Parse(e.to_string()))?;
        fs::write(self.slot_path(), json)?;
        debug!(
            "Saved session snapshot: {} rows",
            snapshot.rows.len()
        );
        Ok(())
    }

    /// Load the stored snapshot, if any. Corrupt data is discarded.
    pub fn load(&self) -> Option<SessionSnapshot> {
        let path = self.slot_path();
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Discarding corrupt session snapshot {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(self.slot_path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataTable;

    fn sample_table() -> DataTable {
        DataTable::from_parts(
            "people.csv",
            vec!["name".to_string(), "age".to_string()],
            vec![
                DataRow::new(vec!["Alice".into(), "30".into()]),
                DataRow::new(vec!["Bob".into(), "25".into()]),
            ],
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().to_path_buf());

        let table = sample_table();
        store
            .save(&SessionSnapshot::from_table(&table, Some("people.csv")))
            .unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.file_name.as_deref(), Some("people.csv"));
        let (restored, _) = snapshot.into_table();
        assert_eq!(restored.column_names(), vec!["name", "age"]);
        assert_eq!(restored.row_count(), 2);
        assert_eq!(restored.get_value(1, 0), Some("Bob"));
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().to_path_buf());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().to_path_buf());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.slot_path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().to_path_buf());
        store
            .save(&SessionSnapshot::from_table(&sample_table(), None))
            .unwrap();
        store.clear();
        assert!(store.load().is_none());
    }
}
