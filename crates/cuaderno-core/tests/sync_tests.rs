//! Load/save orchestration across the local store and the remote mirror.

mod common;

use std::sync::Arc;

use common::sample_document;
use cuaderno_core::{
    DataService, DocumentStore, FileStore, LoadSource, ManualClock, MemoryMirror, MemoryStore,
};
use serde_json::json;

fn service_with(store: Arc<MemoryStore>, mirror: Arc<MemoryMirror>) -> DataService {
    DataService::new(store)
        .with_remote(mirror)
        .with_clock(Arc::new(ManualClock::default()))
}

#[tokio::test]
async fn remote_wins_over_local() {
    let store = Arc::new(MemoryStore::with_document(sample_document().to_string()));
    let mirror = Arc::new(MemoryMirror::with_document(json!({
        "categories": [ { "id": "r1", "name": "Remoto", "items": [ { "key": "k" } ] } ]
    })));
    let mut service = service_with(store, mirror);

    let dataset = service.load().await;
    assert_eq!(dataset.categories.len(), 1);
    assert_eq!(dataset.categories[0].id, "r1");
    // normalized on the way in
    assert_eq!(dataset.categories[0].emoji, "📁");
    assert!(!dataset.categories[0].items[0].id.is_empty());
    assert_eq!(service.load_source(), Some(LoadSource::Remote));
}

#[tokio::test]
async fn unusable_remote_falls_back_to_local() {
    let cases = [
        MemoryMirror::new(),
        MemoryMirror::with_document(json!({ "categories": { "c1": {} } })),
        MemoryMirror::with_document(json!("just a string")),
        {
            let offline = MemoryMirror::with_document(json!({ "categories": [] }));
            offline.set_online(false);
            offline
        },
    ];

    for mirror in cases {
        let store = Arc::new(MemoryStore::with_document(sample_document().to_string()));
        let mut service = service_with(store, Arc::new(mirror));

        let dataset = service.load().await;
        assert_eq!(dataset.categories.len(), 3);
        assert_eq!(service.load_source(), Some(LoadSource::Local));
    }
}

#[tokio::test]
async fn invalid_local_document_falls_back_to_default() {
    for document in ["", "{ broken", "{\"version\":1}", "{\"categories\":null}"] {
        let store = Arc::new(MemoryStore::with_document(document));
        let mut service = service_with(store, Arc::new(MemoryMirror::new()));

        let dataset = service.load().await;
        assert_eq!(dataset.categories.len(), 8);
        assert_eq!(dataset.item_count(), 0);
        assert_eq!(service.load_source(), Some(LoadSource::Default));
    }
}

#[tokio::test]
async fn save_writes_local_before_returning_and_never_waits_for_remote() {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(MemoryMirror::held());
    let mut service = service_with(store.clone(), mirror.clone());
    service.load().await;

    service.create_category("Viajes", "✈️").unwrap();

    // Local durability before control returns; remote write still parked.
    let stored: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert_eq!(stored["categories"][8]["name"], "Viajes");
    assert_eq!(mirror.store_count(), 0);
    assert_eq!(service.pending_remote_writes(), 1);

    // Later local work is not held up either.
    let viajes = service.dataset().categories[8].id.clone();
    service.create_item(&viajes, "Cusco", "Machu Picchu", "").unwrap();
    assert_eq!(store.write_count(), 2);

    mirror.release();
    mirror.release();
    service.flush_remote().await;
    assert_eq!(mirror.store_count(), 2);
    assert_eq!(service.pending_remote_writes(), 0);
}

#[tokio::test]
async fn remote_failure_is_swallowed() {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(MemoryMirror::new());
    mirror.set_online(false);
    let mut service = service_with(store.clone(), mirror.clone());
    service.load().await;

    service.create_category("Viajes", "✈️").unwrap();
    service.flush_remote().await;

    assert_eq!(mirror.store_count(), 0);
    assert_eq!(store.write_count(), 1);
    assert_eq!(service.dataset().categories.len(), 9);
}

#[tokio::test]
async fn remote_receives_the_saved_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let mirror = Arc::new(MemoryMirror::new());
    let mut service = service_with(store, mirror.clone());
    service.load().await;

    service.create_category("Viajes", "✈️").unwrap();
    service.flush_remote().await;

    let remote = mirror.document().unwrap();
    assert_eq!(remote["categories"].as_array().unwrap().len(), 9);
    assert_eq!(remote["updatedAt"], service.dataset().updated_at.as_str());
}

#[tokio::test]
async fn storage_failure_keeps_data_in_memory() {
    let store = Arc::new(MemoryStore::failing());
    let mut service = DataService::new(store.clone()).with_clock(Arc::new(ManualClock::default()));
    service.load().await;

    let dataset = service.create_category("Viajes", "✈️").unwrap();
    assert_eq!(dataset.categories.len(), 9);
    assert!(store.document().is_none());

    // Next successful write persists everything
    store.set_fail_writes(false);
    service.save().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&store.document().unwrap()).unwrap();
    assert_eq!(stored["categories"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::default());

    let saved = {
        let mut service = DataService::new(Arc::new(FileStore::new(dir.path(), "crush_book_v1")))
            .with_clock(clock.clone());
        service.load().await;
        let first = service.dataset().categories[0].id.clone();
        service.create_item(&first, "Pizza", "Mushroom", "con extra queso").unwrap();
        service.dataset().clone()
    };

    let mut service = DataService::new(Arc::new(FileStore::new(dir.path(), "crush_book_v1")))
        .with_clock(clock);
    let loaded = service.load().await;
    assert_eq!(loaded, &saved);
    assert_eq!(service.load_source(), Some(LoadSource::Local));
}

#[tokio::test]
async fn wipe_removes_the_local_document_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path(), "crush_book_v1"));
    store.write(&sample_document().to_string()).unwrap();

    let mut service = DataService::new(store.clone()).with_clock(Arc::new(ManualClock::default()));
    service.load().await;
    assert_eq!(service.load_source(), Some(LoadSource::Local));

    service.reset_dataset().unwrap();
    let reloaded: serde_json::Value = serde_json::from_str(&store.read().unwrap().unwrap()).unwrap();
    assert_eq!(reloaded["categories"].as_array().unwrap().len(), 8);
    assert!(!dir.path().join("crush_book_v1.json.tmp").exists());
}
