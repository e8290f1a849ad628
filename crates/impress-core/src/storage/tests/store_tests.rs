use serde_json::json;
use tempfile::tempdir;

use crate::storage::error::StorageSystemError;
use crate::storage::records::DataRecord;
use crate::storage::schema::{impress_schema, StoreSchema, TableSchema};
use crate::storage::store::LocalStore;

#[test]
fn test_open_creates_declared_tables() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = LocalStore::open(temp_dir.path(), impress_schema()).expect("open failed");

    assert!(store.is_ready());
    assert!(store.path().exists());
    assert_eq!(store.name(), "impress");
    assert_eq!(store.version(), 1);
    assert!(store.table("data").is_ok());
    assert!(store.table("dpt").is_ok());
    assert!(matches!(
        store.table("missing"),
        Err(StorageSystemError::TableNotFound(ref t)) if t == "missing"
    ));
}

#[test]
fn test_open_creates_missing_directory() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let nested = temp_dir.path().join("a").join("b");
    let store = LocalStore::open(&nested, impress_schema()).expect("open failed");
    assert!(store.path().starts_with(&nested));
}

#[test]
fn test_open_rejects_invalid_schema_before_touching_disk() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let dir = temp_dir.path().join("never");
    let schema = StoreSchema::new("broken", 1).table(TableSchema::new("t"));

    let result = LocalStore::open(&dir, schema);
    assert!(matches!(result, Err(StorageSystemError::InvalidSchema { .. })));
    assert!(!dir.exists(), "store directory must not be created for an invalid schema");
}

#[test]
fn test_open_fails_when_location_is_a_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let file_path = temp_dir.path().join("occupied");
    std::fs::write(&file_path, b"not a directory").unwrap();

    let result = LocalStore::open(&file_path, impress_schema());
    assert!(matches!(result, Err(StorageSystemError::Io { .. })));
}

#[test]
fn test_reopen_keeps_records() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    {
        let store = LocalStore::open(temp_dir.path(), impress_schema()).unwrap();
        store.put_record(&DataRecord::new("abc123", "example.com", "rss")).unwrap();
    }

    let reopened = LocalStore::open(temp_dir.path(), impress_schema()).unwrap();
    let record: Option<DataRecord> = reopened.get_record("abc123").unwrap();
    assert_eq!(record.map(|r| r.domain), Some("example.com".to_string()));
}

#[test]
fn test_two_handles_see_the_same_records() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let first = LocalStore::open(temp_dir.path(), impress_schema()).unwrap();
    let second = LocalStore::open(temp_dir.path(), impress_schema()).unwrap();

    first
        .table("dpt")
        .unwrap()
        .put(json!({"url_crc": "k1", "status": "seen"}))
        .unwrap();

    let seen = second.table("dpt").unwrap().get("k1").unwrap();
    assert_eq!(seen, Some(json!({"url_crc": "k1", "status": "seen"})));
}

#[test]
fn test_same_version_with_different_schema_conflicts() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    LocalStore::open(temp_dir.path(), impress_schema()).unwrap();

    let changed = StoreSchema::new("impress", 1)
        .table(TableSchema::new("data").primary_key("url_crc").index("domain"))
        .table(TableSchema::new("dpt").primary_key("url_crc"));
    let result = LocalStore::open(temp_dir.path(), changed);
    assert!(matches!(
        result,
        Err(StorageSystemError::SchemaConflict { version: 1, .. })
    ));
}

#[test]
fn test_same_version_with_reordered_indexes_is_accepted() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    LocalStore::open(temp_dir.path(), impress_schema()).unwrap();

    let reordered = StoreSchema::new("impress", 1)
        .table(
            TableSchema::new("data")
                .primary_key("url_crc")
                .index("impress")
                .index("comments_count")
                .index("click_count")
                .index("source_type")
                .index("domain"),
        )
        .table(TableSchema::new("dpt").primary_key("url_crc"));
    assert!(LocalStore::open(temp_dir.path(), reordered).is_ok());
}

#[test]
fn test_additive_upgrade_keeps_data_and_adds_tables() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    {
        let store = LocalStore::open(temp_dir.path(), impress_schema()).unwrap();
        store.put_record(&DataRecord::new("abc123", "example.com", "rss")).unwrap();
    }

    let mut v2 = impress_schema();
    v2.version = 2;
    v2.tables.push(TableSchema::new("feeds").primary_key("id").index("url"));
    let store = LocalStore::open(temp_dir.path(), v2).unwrap();

    assert_eq!(store.version(), 2);
    assert!(store.is_ready());
    assert_eq!(store.table("data").unwrap().count().unwrap(), 1);
    assert_eq!(store.table("feeds").unwrap().count().unwrap(), 0);
}

#[test]
fn test_upgrade_dropping_a_table_conflicts() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    LocalStore::open(temp_dir.path(), impress_schema()).unwrap();

    let v2 = StoreSchema::new("impress", 2)
        .table(impress_schema().get_table("data").unwrap().clone());
    assert!(matches!(
        LocalStore::open(temp_dir.path(), v2),
        Err(StorageSystemError::SchemaConflict { .. })
    ));
}

#[test]
fn test_opening_with_older_version_is_a_downgrade() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let mut v3 = impress_schema();
    v3.version = 3;
    LocalStore::open(temp_dir.path(), v3).unwrap();

    let result = LocalStore::open(temp_dir.path(), impress_schema());
    assert!(matches!(
        result,
        Err(StorageSystemError::VersionDowngrade { stored: 3, declared: 1, .. })
    ));
}

#[test]
fn test_every_declared_index_exists_when_names_overlap() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    // `a_b.c` and `a.b_c` would share a name if joined with `_`
    let schema = StoreSchema::new("overlap", 1)
        .table(TableSchema::new("a_b").primary_key("k").index("c"))
        .table(TableSchema::new("a").primary_key("k").index("b_c"));
    let store = LocalStore::open(temp_dir.path(), schema).expect("open failed");

    let indexes: Vec<(String, String)> = {
        let conn = store.lock("test").unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT name, tbl_name FROM sqlite_master \
                 WHERE type = 'index' AND name LIKE 'idx:%' ORDER BY tbl_name",
            )
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    };
    assert_eq!(
        indexes,
        vec![
            ("idx:a:b_c".to_string(), "t_a".to_string()),
            ("idx:a_b:c".to_string(), "t_a_b".to_string()),
        ]
    );

    store.table("a").unwrap().put(json!({"k": "x", "b_c": 1})).unwrap();
    store.table("a_b").unwrap().put(json!({"k": "y", "c": 1})).unwrap();
    assert_eq!(store.table("a").unwrap().where_equals("b_c", &json!(1)).unwrap().len(), 1);
    assert_eq!(store.table("a_b").unwrap().where_equals("c", &json!(1)).unwrap().len(), 1);
}
