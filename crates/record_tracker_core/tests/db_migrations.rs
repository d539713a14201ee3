use record_tracker_core::db::migrations::{apply_migrations, latest_version};
use record_tracker_core::db::{
    ensure_document_schema, open_db, open_db_in_memory, DbError, DOCUMENTS_TABLE,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "documents");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "documents");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn apply_migrations_reports_steps_run() {
    let mut conn = Connection::open_in_memory().unwrap();

    assert_eq!(apply_migrations(&mut conn).unwrap(), latest_version() as usize);
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
}

#[test]
fn document_schema_check_accepts_opened_database() {
    let conn = open_db_in_memory().unwrap();
    ensure_document_schema(&conn).unwrap();
}

#[test]
fn document_schema_check_rejects_raw_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match ensure_document_schema(&conn).unwrap_err() {
        DbError::SchemaNotApplied {
            db_version,
            expected,
        } => {
            assert_eq!(db_version, 0);
            assert_eq!(expected, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn document_schema_check_rejects_dropped_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(&format!("DROP TABLE {DOCUMENTS_TABLE};"))
        .unwrap();

    let err = ensure_document_schema(&conn).unwrap_err();
    assert!(matches!(err, DbError::MissingDocumentsTable), "{err}");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
