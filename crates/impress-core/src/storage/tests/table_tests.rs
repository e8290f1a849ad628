use serde_json::json;
use tempfile::{tempdir, TempDir};

use crate::storage::error::StorageSystemError;
use crate::storage::records::{DataRecord, DptRecord};
use crate::storage::schema::impress_schema;
use crate::storage::store::LocalStore;
use crate::storage::table::RecordKey;

// Helper keeping the temp dir alive alongside the store
fn open_store() -> (TempDir, LocalStore) {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = LocalStore::open(temp_dir.path(), impress_schema()).expect("open failed");
    (temp_dir, store)
}

#[test]
fn test_get_before_insert_then_after() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();

    assert_eq!(data.get("abc123").unwrap(), None);

    let record = json!({
        "url_crc": "abc123",
        "domain": "example.com",
        "source_type": "rss",
        "click_count": 0,
        "comments_count": 0,
        "impress": 1
    });
    let key = data.put(record.clone()).unwrap();
    assert_eq!(key, RecordKey::Text("abc123".to_string()));
    assert_eq!(data.get("abc123").unwrap(), Some(record));
}

#[test]
fn test_put_with_same_key_overwrites() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();

    data.put(json!({"url_crc": "k", "domain": "first.org", "impress": 1})).unwrap();
    data.put(json!({"url_crc": "k", "domain": "second.org", "impress": 2})).unwrap();

    assert_eq!(data.count().unwrap(), 1);
    assert_eq!(
        data.get("k").unwrap(),
        Some(json!({"url_crc": "k", "domain": "second.org", "impress": 2}))
    );
}

#[test]
fn test_add_rejects_existing_key() {
    let (_dir, store) = open_store();
    let dpt = store.table("dpt").unwrap();

    dpt.add(json!({"url_crc": "k"})).unwrap();
    let err = dpt.add(json!({"url_crc": "k", "other": true})).unwrap_err();
    assert!(matches!(err, StorageSystemError::KeyExists { ref table, .. } if table == "dpt"));
    assert_eq!(dpt.get("k").unwrap(), Some(json!({"url_crc": "k"})));
}

#[test]
fn test_text_and_integer_keys_are_distinct() {
    let (_dir, store) = open_store();
    let dpt = store.table("dpt").unwrap();

    dpt.put(json!({"url_crc": "42", "kind": "text"})).unwrap();
    dpt.put(json!({"url_crc": 42, "kind": "int"})).unwrap();

    assert_eq!(dpt.count().unwrap(), 2);
    assert_eq!(dpt.get("42").unwrap().unwrap()["kind"], "text");
    assert_eq!(dpt.get(42i64).unwrap().unwrap()["kind"], "int");
}

#[test]
fn test_invalid_records_are_rejected() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();

    assert!(matches!(
        data.put(json!(["not", "an", "object"])),
        Err(StorageSystemError::InvalidRecord { .. })
    ));
    assert!(matches!(
        data.put(json!({"domain": "no-key.org"})),
        Err(StorageSystemError::InvalidKey { .. })
    ));
    assert!(matches!(
        data.put(json!({"url_crc": 1.5})),
        Err(StorageSystemError::InvalidKey { .. })
    ));
    assert_eq!(data.count().unwrap(), 0);
}

#[test]
fn test_update_merges_fields() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();
    data.put(json!({"url_crc": "k", "domain": "a.org", "click_count": 1})).unwrap();

    assert!(data.update("k", json!({"click_count": 2, "note": "hot"})).unwrap());
    assert_eq!(
        data.get("k").unwrap(),
        Some(json!({"url_crc": "k", "domain": "a.org", "click_count": 2, "note": "hot"}))
    );

    assert!(!data.update("missing", json!({"click_count": 9})).unwrap());
    assert!(matches!(
        data.update("k", json!({"url_crc": "other"})),
        Err(StorageSystemError::InvalidKey { .. })
    ));
}

#[test]
fn test_delete_and_clear() {
    let (_dir, store) = open_store();
    let dpt = store.table("dpt").unwrap();
    dpt.put(json!({"url_crc": "a"})).unwrap();
    dpt.put(json!({"url_crc": "b"})).unwrap();

    assert!(dpt.delete("a").unwrap());
    assert!(!dpt.delete("a").unwrap());
    assert_eq!(dpt.count().unwrap(), 1);

    dpt.clear().unwrap();
    assert_eq!(dpt.count().unwrap(), 0);
}

#[test]
fn test_bulk_put_is_all_or_nothing() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();

    let written = data
        .bulk_put(vec![
            json!({"url_crc": "b", "domain": "b.org"}),
            json!({"url_crc": "a", "domain": "a.org"}),
        ])
        .unwrap();
    assert_eq!(written, 2);

    let rejected = data.bulk_put(vec![
        json!({"url_crc": "c", "domain": "c.org"}),
        json!({"domain": "missing-key.org"}),
    ]);
    assert!(rejected.is_err());
    assert_eq!(data.count().unwrap(), 2);

    let keys: Vec<String> = data
        .all()
        .unwrap()
        .iter()
        .map(|r| r["url_crc"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn test_where_equals_uses_declared_indexes() {
    let (_dir, store) = open_store();
    let data = store.table("data").unwrap();
    data.bulk_put(vec![
        json!({"url_crc": "1", "domain": "a.org", "source_type": "rss", "impress": 3}),
        json!({"url_crc": "2", "domain": "b.org", "source_type": "rss", "impress": 1}),
        json!({"url_crc": "3", "domain": "a.org", "source_type": "web", "impress": 3}),
    ])
    .unwrap();

    let by_domain = data.where_equals("domain", &json!("a.org")).unwrap();
    assert_eq!(by_domain.len(), 2);
    assert_eq!(by_domain[0]["url_crc"], "1");
    assert_eq!(by_domain[1]["url_crc"], "3");

    let by_impress = data.where_equals("impress", &json!(3)).unwrap();
    assert_eq!(by_impress.len(), 2);

    assert!(data.where_equals("source_type", &json!(null)).unwrap().is_empty());

    let err = data.where_equals("note", &json!("x")).unwrap_err();
    assert!(matches!(err, StorageSystemError::NotIndexed { ref field, .. } if field == "note"));

    // The primary key is always queryable
    assert_eq!(data.where_equals("url_crc", &json!("2")).unwrap().len(), 1);

    // dpt declares no secondary indexes at all
    let dpt = store.table("dpt").unwrap();
    assert!(dpt.where_equals("url_crc", &json!("1")).unwrap().is_empty());
    assert!(dpt.where_equals("status", &json!("seen")).is_err());
}

#[test]
fn test_typed_records_keep_extra_fields() {
    let (_dir, store) = open_store();

    let mut record = DataRecord::new("abc123", "example.com", "rss");
    record.impress = 1;
    record.extra.insert("title".to_string(), json!("Hello"));
    store.put_record(&record).unwrap();

    let loaded: DataRecord = store.get_record("abc123").unwrap().unwrap();
    assert_eq!(loaded, record);

    let raw = store.table("data").unwrap().get("abc123").unwrap().unwrap();
    assert_eq!(raw["title"], "Hello");

    let mut dpt = DptRecord::new("abc123");
    dpt.extra.insert("depth".to_string(), json!(2));
    store.put_record(&dpt).unwrap();
    let loaded: Option<DptRecord> = store.get_record("abc123").unwrap();
    assert_eq!(loaded, Some(dpt));
}

#[test]
fn test_page_returns_a_window_in_key_order() {
    let (_dir, store) = open_store();
    let dpt = store.table("dpt").unwrap();
    for key in ["d", "b", "e", "a", "c"] {
        dpt.put(json!({"url_crc": key})).unwrap();
    }

    let keys = |rows: Vec<serde_json::Value>| -> Vec<String> {
        rows.iter().map(|r| r["url_crc"].as_str().unwrap().to_string()).collect()
    };
    assert_eq!(keys(dpt.page(0, 2).unwrap()), vec!["a", "b"]);
    assert_eq!(keys(dpt.page(3, 10).unwrap()), vec!["d", "e"]);
    assert!(dpt.page(5, 10).unwrap().is_empty());
    assert!(dpt.page(0, 0).unwrap().is_empty());
}
