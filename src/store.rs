use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Namespace applied to every key so the store can be shared with other data.
pub const STORAGE_KEY_PREFIX: &str = "@FitnessTracker:";

pub const WORKOUT_SESSIONS_KEY: &str = "workoutSessions";
pub const USER_PREFERENCES_KEY: &str = "userPreferences";

pub fn prefixed_key(key: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, key)
}

/// Key/value storage for JSON documents. Keys passed in are logical keys; implementations
/// apply [`STORAGE_KEY_PREFIX`].
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn save_raw(&self, key: &str, json: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Loads and parses a value. Missing keys, read failures and malformed JSON all come back
/// as `None`; failures are logged.
pub async fn load_json<T: DeserializeOwned>(store: &dyn PersistentStore, key: &str) -> Option<T> {
    let raw = match store.load_raw(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::error!("Error loading data for key \"{}\": {}", key, err);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!("Error parsing data for key \"{}\": {}", key, err);
            None
        }
    }
}

pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn PersistentStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.save_raw(key, json).await
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .get(&prefixed_key(key))
            .map(|entry| entry.value().clone()))
    }

    async fn save_raw(&self, key: &str, json: String) -> Result<(), StoreError> {
        self.entries.insert(prefixed_key(key), json);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(&prefixed_key(key));
        Ok(())
    }
}

/// One JSON file per key inside a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = prefixed_key(key)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl PersistentStore for JsonFileStore {
    async fn load_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_raw(&self, key: &str, json: String) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!("Saved {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
