//! Integration tests for the CSV to DuckDB run
//!
//! Each test writes CSV snapshots and a work list into a temporary
//! directory, runs them into a database file, then reads the tables back.

use duckload::cli::{RunOptions, check_work_list, run_work_list, show_table};
use duckload::config::Settings;
use duckload::error::{EtlError, PipelineError, Stage};
use duckload::{Cell, DuckDbStore, TableStore};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WIDGETS_CSV: &str = "id,name\n1,A\n1,A\n2,\n";

const CONTACTS_CSV: &str = "\
type,company,firstName,isActive
lead,Acme,Ann,true
lead,Acme,Ann,true
client,,Bob,true
client,Initech,Cid,false
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn options(dir: &TempDir) -> RunOptions {
    RunOptions {
        database: Some(dir.path().join("test.db").to_string_lossy().into_owned()),
        ..Default::default()
    }
}

fn read_rows(dir: &TempDir, table: &str) -> Vec<Vec<Cell>> {
    let store = DuckDbStore::open(dir.path().join("test.db")).unwrap();
    let rows = store.read_table(table).unwrap().sorted_rows();
    store.close().unwrap();
    rows
}

#[test]
fn test_widgets_end_to_end() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: widgets\n    path: widgets.csv\n    transform:\n      fill_value: Unknown\n",
    );

    let report = run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();

    assert_eq!(report.loaded, vec![("widgets".to_string(), 2)]);
    assert!(report.failures.is_empty());
    assert_eq!(
        read_rows(&dir, "widgets"),
        vec![
            vec![Cell::Int(1), "A".into()],
            vec![Cell::Int(2), "Unknown".into()],
        ]
    );
}

#[test]
fn test_rerun_replaces_rows() {
    let dir = TempDir::new().unwrap();
    let csv = write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );

    run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();
    run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();
    assert_eq!(read_rows(&dir, "widgets").len(), 2, "rerun does not append");

    std::fs::write(&csv, "id,name\n7,Z\n").unwrap();
    run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();
    assert_eq!(read_rows(&dir, "widgets"), vec![vec![Cell::Int(7), "Z".into()]]);
}

#[test]
fn test_builtin_contacts_rule() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "contacts.csv", CONTACTS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: contacts\n    path: contacts.csv\n",
    );

    let report = run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();

    assert_eq!(report.total_rows(), 2);
    assert_eq!(
        read_rows(&dir, "contacts"),
        vec![
            vec!["client".into(), "Unknown".into(), "Bob".into(), Cell::Bool(true)],
            vec!["lead".into(), "Acme".into(), "Ann".into(), Cell::Bool(true)],
        ]
    );
}

#[test]
fn test_unknown_entity_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n  - name: gadgets\n    path: gadgets.csv\n",
    );

    let err = run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Aborted(failure)) => {
            assert_eq!(failure.entity, "gadgets");
            assert_eq!(failure.stage, Stage::Resolve);
            assert!(matches!(failure.error, EtlError::UnknownEntity { .. }));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    assert!(
        !dir.path().join("test.db").exists(),
        "database file is not created when a name is unknown"
    );
}

#[test]
fn test_keep_going_with_unknown_entity_loads_the_rest() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: gadgets\n    path: gadgets.csv\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );
    let options = RunOptions {
        keep_going: true,
        ..options(&dir)
    };

    let err = run_work_list(&worklist, &options, &Settings::default()).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Incomplete(report)) => {
            assert_eq!(report.loaded, vec![("widgets".to_string(), 2)]);
            assert_eq!(report.failures[0].stage, Stage::Resolve);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_fail_fast_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: gadgets\n    path: missing.csv\n    transform: {}\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );

    let err = run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Aborted(failure)) => {
            assert_eq!(failure.entity, "gadgets");
            assert_eq!(failure.stage, Stage::Extract);
            assert!(matches!(failure.error, EtlError::SourceUnavailable { .. }));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let store = DuckDbStore::open(dir.path().join("test.db")).unwrap();
    assert!(!store.table_exists("widgets").unwrap());
}

#[test]
fn test_keep_going_loads_the_rest() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: gadgets\n    path: missing.csv\n    transform: {}\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );
    let options = RunOptions {
        keep_going: true,
        ..options(&dir)
    };

    let err = run_work_list(&worklist, &options, &Settings::default()).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::Incomplete(report)) => {
            assert_eq!(report.loaded, vec![("widgets".to_string(), 2)]);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].entity, "gadgets");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(read_rows(&dir, "widgets").len(), 2);
}

#[test]
fn test_include_filter_limits_run() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: gadgets\n    path: missing.csv\n    transform: {}\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );
    let options = RunOptions {
        include: Some("^wid".to_string()),
        ..options(&dir)
    };

    let report = run_work_list(&worklist, &options, &Settings::default()).unwrap();
    assert_eq!(report.loaded.len(), 1);
}

#[test]
fn test_semicolon_delimited_snapshot() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", "id;name\n1;A\n2;B\n");
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "delimiter: \";\"\nentities:\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );

    run_work_list(&worklist, &options(&dir), &Settings::default()).unwrap();
    assert_eq!(
        read_rows(&dir, "widgets"),
        vec![vec![Cell::Int(1), "A".into()], vec![Cell::Int(2), "B".into()]]
    );
}

#[test]
fn test_check_work_list() {
    let dir = TempDir::new().unwrap();
    let good = write(
        dir.path(),
        "good.yml",
        "entities:\n  - name: contacts\n    path: contacts.csv\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );
    let bad = write(
        dir.path(),
        "bad.yml",
        "entities:\n  - name: gadgets\n    path: gadgets.csv\n",
    );

    assert_eq!(check_work_list(&good).unwrap(), 2);
    assert!(check_work_list(&bad).is_err());
    assert!(!dir.path().join("test.db").exists());
}

#[test]
fn test_show_table() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "widgets.csv", WIDGETS_CSV);
    let worklist = write(
        dir.path(),
        "worklist.yml",
        "entities:\n  - name: widgets\n    path: widgets.csv\n    transform: {}\n",
    );
    let options = options(&dir);
    run_work_list(&worklist, &options, &Settings::default()).unwrap();

    let database = options.database.unwrap();
    let mut rows = show_table(&database, "widgets", 10).unwrap();
    rows.sort_by_key(|row| row["id"].as_i64());
    assert_eq!(
        rows,
        vec![
            json!({"id": 1, "name": "A"}),
            json!({"id": 2, "name": "Unknown"}),
        ]
    );

    assert_eq!(show_table(&database, "widgets", 1).unwrap().len(), 1);
    assert!(show_table(&database, "gadgets", 10).is_err());
}
