mod common;

use chrono::{DateTime, Duration, Utc};
use common::legacy_record;
use layer_registry::app::ports::DocumentStorePort;
use layer_registry::infra::sqlite_store::SqliteDocumentStore;
use layer_registry::types::{LayerType, RecordType};

#[tokio::test]
async fn records_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("registry.db");
    let record = legacy_record("roads", Utc::now());

    {
        let store = SqliteDocumentStore::open(&path).unwrap();
        store.put("roads", &record).await.unwrap();
    }

    let store = SqliteDocumentStore::open(&path).unwrap();
    assert_eq!(store.get("roads").await.unwrap(), Some(record));
    assert!(store.get("rivers").await.unwrap().is_none());
}

#[tokio::test]
async fn put_replaces_and_delete_reports_presence() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("registry.db")).unwrap();

    let mut record = legacy_record("roads", Utc::now());
    store.put("roads", &record).await.unwrap();
    record.record_type = RecordType::Feature;
    record.data.en.layer_type = LayerType::Feature;
    store.put("roads", &record).await.unwrap();

    let stored = store.get("roads").await.unwrap().unwrap();
    assert_eq!(stored.record_type, RecordType::Feature);
    assert_eq!(store.list_keys(None).await.unwrap(), vec!["roads".to_string()]);

    assert!(store.delete("roads").await.unwrap());
    assert!(!store.delete("roads").await.unwrap());
    assert!(store.list_keys(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_keys_filters_by_age() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteDocumentStore::open(dir.path().join("registry.db")).unwrap();
    let now = Utc::now();

    for (key, age_days) in [("b-old", 40), ("a-old", 8), ("fresh", 1)] {
        store
            .put(key, &legacy_record(key, now - Duration::days(age_days)))
            .await
            .unwrap();
    }

    assert_eq!(
        store.list_keys(None).await.unwrap(),
        vec!["a-old".to_string(), "b-old".to_string(), "fresh".to_string()]
    );
    assert_eq!(
        store.list_keys(Some(now - Duration::days(7))).await.unwrap(),
        vec!["a-old".to_string(), "b-old".to_string()]
    );
    assert!(store
        .list_keys(Some(now - Duration::days(90)))
        .await
        .unwrap()
        .is_empty());
    // earliest representable cutoff still compares below every stored timestamp
    assert!(store
        .list_keys(Some(DateTime::<Utc>::MIN_UTC))
        .await
        .unwrap()
        .is_empty());
}
