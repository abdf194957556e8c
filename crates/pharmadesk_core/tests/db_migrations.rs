use pharmadesk_core::db::migrations::latest_version;
use pharmadesk_core::db::{open_db, open_db_in_memory, DbError};
use pharmadesk_core::store::{KeyValueStore, SqliteKeyValueStore, PURCHASE_ORDERS_KEY};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn reopening_database_keeps_stored_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("pharmadesk.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    SqliteKeyValueStore::new(&conn_first, u64::MAX)
        .set(PURCHASE_ORDERS_KEY, "[]")
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let store = SqliteKeyValueStore::new(&conn_second, u64::MAX);
    assert_eq!(
        store.get(PURCHASE_ORDERS_KEY).unwrap().as_deref(),
        Some("[]")
    );
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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
fn store_directory_that_cannot_be_created_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("data");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = open_db(blocker.join("nested").join("pharmadesk.sqlite3")).unwrap_err();
    match &err {
        DbError::CreateDir { path, .. } => assert_eq!(path, &blocker.join("nested")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("cannot create store directory"));
    assert!(std::error::Error::source(&err).is_some());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
