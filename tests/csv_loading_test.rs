use std::fs;
use tabgrid::data::store::SessionStore;
use tabgrid::data::datatable::ColumnType;
use tabgrid::engine::GridEngine;
use tabgrid::error::GridError;
use tabgrid::Config;

#[test]
fn load_csv_file_infers_types_and_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(
        &path,
        "id,total,shipped,ordered_on,contact\n\
         1,\"1,200\",yes,2024-01-15,a@example.com\n\
         2,350,no,2024-02-01,b@example.com\n\
         3,99,true,2024-03-20,c@example.com\n",
    )
    .unwrap();

    let mut engine = GridEngine::default();
    engine.load_csv_file(&path).unwrap();

    assert_eq!(engine.file_name(), Some("orders.csv"));
    let types: Vec<ColumnType> = engine
        .snapshot()
        .column_types
        .iter()
        .map(|(_, t)| *t)
        .collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Number,
            ColumnType::Number,
            ColumnType::Boolean,
            ColumnType::Date,
            ColumnType::Email,
        ]
    );
    assert_eq!(engine.table().row_count(), 3);
}

#[test]
fn tab_separated_text_is_sniffed() {
    let mut engine = GridEngine::default();
    engine
        .load_from_text("name\tage\nAlice\t30\nBob\t25", "clipboard")
        .unwrap();
    assert_eq!(engine.snapshot().headers, vec!["name", "age"]);
    assert_eq!(engine.table().get_value(1, 1), Some("25"));
}

#[test]
fn ragged_rows_are_repaired_not_rejected() {
    let mut engine = GridEngine::default();
    engine
        .load_from_text("a,b,c\n1\n1,2,3,4\n,,", "clipboard")
        .unwrap();
    // Short rows pad, long rows truncate, all-empty rows are dropped
    assert_eq!(engine.table().row_count(), 2);
    assert_eq!(engine.table().get_value(0, 1), Some(""));
    assert_eq!(engine.table().get_value(1, 2), Some("3"));
}

#[test]
fn empty_text_is_rejected() {
    let mut engine = GridEngine::default();
    assert!(matches!(
        engine.load_from_text("  \n\n  ", "clipboard"),
        Err(GridError::EmptyInput)
    ));
    // The failed load leaves the engine empty and usable
    assert_eq!(engine.snapshot().total_row_count, 0);
    engine.load_from_text("a\n1", "clipboard").unwrap();
    assert_eq!(engine.snapshot().total_row_count, 1);
}

#[test]
fn session_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = SessionStore::open(dir.path().to_path_buf());
        let mut engine = GridEngine::new(Config::default()).with_store(store);
        engine
            .load_from_text("name,age\nAlice,30\nBob,25", "people.csv")
            .unwrap();
        let alice = engine.table().row_id(0).unwrap();
        engine.set_cell(alice, "age", "31").unwrap();
    }

    // A fresh engine picks up the edited content; history does not
    // survive the restart
    let store = SessionStore::open(dir.path().to_path_buf());
    let engine = GridEngine::new(Config::default()).with_store(store);
    assert_eq!(engine.file_name(), Some("people.csv"));
    assert_eq!(engine.table().get_value(0, 1), Some("31"));
    assert!(!engine.snapshot().can_undo);
}

#[test]
fn clear_data_removes_persisted_session() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = SessionStore::open(dir.path().to_path_buf());
        let mut engine = GridEngine::new(Config::default()).with_store(store);
        engine.load_from_text("a\n1", "x.csv").unwrap();
        engine.clear_data();
    }

    let store = SessionStore::open(dir.path().to_path_buf());
    let engine = GridEngine::new(Config::default()).with_store(store);
    assert_eq!(engine.snapshot().total_row_count, 0);
    assert!(engine.file_name().is_none());
}

#[test]
fn export_files_land_in_requested_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = GridEngine::default();
    engine.load_from_text("a,b\n1,2", "x.csv").unwrap();

    let csv_path = engine.write_csv_file(dir.path(), false).unwrap();
    assert!(csv_path.exists());
    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("\"a\",\"b\""));

    let json_path = engine.write_json_file(dir.path(), false).unwrap();
    assert!(json_path.exists());
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["a"], "1");
}
