use quickdial_store::Store;
use tempfile::TempDir;

#[test]
fn migrations_apply_once() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store.migrate().expect("migrate again");

    let version: i64 = store
        .connection()
        .query_row("SELECT version FROM quickdial_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .expect("schema version");
    assert_eq!(version, 1);
    assert_eq!(store.schema_version().expect("schema version"), 1);
}

#[test]
fn unmigrated_store_reports_version_zero() {
    let store = Store::open_in_memory().expect("open in memory");
    store
        .connection()
        .execute_batch("CREATE TABLE quickdial_schema (version INTEGER NOT NULL);")
        .expect("create schema table");
    assert_eq!(store.schema_version().expect("schema version"), 0);
}

#[test]
fn newer_database_is_rejected() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
        .connection()
        .execute("UPDATE quickdial_schema SET version = 99;", [])
        .expect("bump version");
    let err = store.migrate().unwrap_err();
    assert!(err.to_string().contains("newer than available migrations"));
}

#[test]
fn file_store_persists_between_opens() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("quickdial.sqlite3");
    {
        let store = Store::open(&path).expect("open");
        store.migrate().expect("migrate");
    }
    let store = Store::open(&path).expect("reopen");
    assert_eq!(store.schema_version().expect("schema version"), 1);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
