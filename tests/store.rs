use std::sync::Arc;

use serde::{Deserialize, Serialize};
use workout_tracker::store::{
    self, prefixed_key, JsonFileStore, MemoryStore, PersistentStore, WORKOUT_SESSIONS_KEY,
};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Item {
    id: String,
    distance: f64,
}

fn items() -> Vec<Item> {
    vec![
        Item {
            id: "s1".to_string(),
            distance: 1000.0,
        },
        Item {
            id: "s2".to_string(),
            distance: 2000.0,
        },
    ]
}

#[test]
fn keys_are_namespaced() {
    assert_eq!(prefixed_key("workoutSessions"), "@FitnessTracker:workoutSessions");
}

#[tokio::test]
async fn memory_store_saves_and_loads_json() {
    let store = MemoryStore::new();
    store::save_json(&store, WORKOUT_SESSIONS_KEY, &items())
        .await
        .expect("save");

    let loaded: Option<Vec<Item>> = store::load_json(&store, WORKOUT_SESSIONS_KEY).await;
    assert_eq!(loaded, Some(items()));

    let raw = store.load_raw(WORKOUT_SESSIONS_KEY).await.expect("raw");
    assert_eq!(raw.as_deref(), Some(r#"[{"id":"s1","distance":1000.0},{"id":"s2","distance":2000.0}]"#));
}

#[tokio::test]
async fn missing_key_loads_as_none() {
    let store = MemoryStore::new();
    let loaded: Option<Vec<Item>> = store::load_json(&store, "nonExistentKey").await;
    assert!(loaded.is_none());
}

#[tokio::test]
async fn malformed_json_loads_as_none() {
    let store = MemoryStore::new();
    store
        .save_raw("invalidDataKey", r#"{"id": 3, value: "Unquoted String"}"#.to_string())
        .await
        .expect("save raw");
    let loaded: Option<Item> = store::load_json(&store, "invalidDataKey").await;
    assert!(loaded.is_none());
}

#[tokio::test]
async fn remove_deletes_the_entry() {
    let store = MemoryStore::new();
    store.save_raw("removeKey", "{}".to_string()).await.expect("save");
    assert_eq!(store.len(), 1);
    store.remove("removeKey").await.expect("remove");
    assert!(store.is_empty());
    // Removing again is fine
    store.remove("removeKey").await.expect("remove twice");
}

#[tokio::test]
async fn file_store_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn PersistentStore> = Arc::new(JsonFileStore::new(dir.path().join("data")));

    let loaded: Option<Vec<Item>> = store::load_json(store.as_ref(), WORKOUT_SESSIONS_KEY).await;
    assert!(loaded.is_none());

    store::save_json(store.as_ref(), WORKOUT_SESSIONS_KEY, &items())
        .await
        .expect("save");
    let loaded: Option<Vec<Item>> = store::load_json(store.as_ref(), WORKOUT_SESSIONS_KEY).await;
    assert_eq!(loaded, Some(items()));

    store.remove(WORKOUT_SESSIONS_KEY).await.expect("remove");
    let loaded: Option<Vec<Item>> = store::load_json(store.as_ref(), WORKOUT_SESSIONS_KEY).await;
    assert!(loaded.is_none());
}

#[test]
fn file_names_are_sanitized() {
    let store = JsonFileStore::new("/tmp/tracker");
    let path = store.path_for(WORKOUT_SESSIONS_KEY);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("_FitnessTracker_workoutSessions.json")
    );
    assert!(path.starts_with(store.dir()));
}
