//! Two-tier key-value persistence.
//!
//! The synchronized tier holds the credential, the local tier holds the
//! pending selection and the summary history. Both tiers sit behind the same
//! async [`KeyValueStore`] trait so the popup can run against JSON files on
//! disk or, when no config dir is available, against memory.
//!
//! Storage failures never reach callers as errors: [`Storage`] logs them and
//! answers "no value", since everything kept here can be re-entered by hand.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared::error::SummarizeError;
use shared::keys;
use shared::records::{Credential, PendingSelection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for SummarizeError {
    fn from(err: StoreError) -> Self {
        SummarizeError::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store used when nothing can be written to disk, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// One JSON object per file, re-read on every access.
///
/// Mutations go through a temp file and a rename so a crash mid-write leaves
/// the previous contents in place.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Follows the user across devices; holds the credential.
    Sync,
    /// This device only; holds pending text and history.
    Local,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Sync => "sync",
            Tier::Local => "local",
        }
    }
}

#[derive(Clone)]
pub struct Storage {
    sync: Arc<dyn KeyValueStore>,
    local: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(sync: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { sync, local }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// File-backed tiers under `dir` (`sync.json`, `local.json`).
    pub fn open_in(dir: &Path) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(dir.join("sync.json"))),
            Arc::new(JsonFileStore::new(dir.join("local.json"))),
        )
    }

    /// File-backed tiers in the user's config dir, or memory if there is none.
    pub fn open_default() -> Self {
        match directories::ProjectDirs::from("com.local", "ParaSummarizer", "ParaSummarizer") {
            Some(proj) => {
                let dir = proj.config_dir().join("storage");
                tracing::info!("storage at {}", dir.display());
                Self::open_in(&dir)
            }
            None => {
                tracing::warn!("no config directory available, storage will not persist");
                Self::in_memory()
            }
        }
    }

    fn tier(&self, tier: Tier) -> &Arc<dyn KeyValueStore> {
        match tier {
            Tier::Sync => &self.sync,
            Tier::Local => &self.local,
        }
    }

    pub async fn get(&self, tier: Tier, key: &str) -> Option<Value> {
        match self.tier(tier).get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tier = tier.as_str(), key, "storage read failed: {}", e);
                None
            }
        }
    }

    /// Returns whether the write was acknowledged.
    pub async fn set(&self, tier: Tier, key: &str, value: Value) -> bool {
        match self.tier(tier).set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(tier = tier.as_str(), key, "storage write failed: {}", e);
                false
            }
        }
    }

    pub async fn remove(&self, tier: Tier, key: &str) -> bool {
        match self.tier(tier).remove(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(tier = tier.as_str(), key, "storage remove failed: {}", e);
                false
            }
        }
    }

    pub async fn load_credential(&self) -> Option<Credential> {
        let value = self.get(Tier::Sync, keys::API_KEY).await?;
        value.as_str().and_then(Credential::new)
    }

    pub async fn save_credential(&self, credential: &Credential) -> bool {
        self.set(
            Tier::Sync,
            keys::API_KEY,
            Value::String(credential.expose().to_string()),
        )
        .await
    }

    pub async fn load_pending(&self) -> Option<PendingSelection> {
        let value = self.get(Tier::Local, keys::SELECTED_TEXT).await?;
        match value.as_str() {
            Some(text) if !text.trim().is_empty() => Some(PendingSelection::new(text)),
            _ => None,
        }
    }

    pub async fn save_pending(&self, pending: &PendingSelection) -> bool {
        self.set(
            Tier::Local,
            keys::SELECTED_TEXT,
            Value::String(pending.text.clone()),
        )
        .await
    }

    pub async fn clear_pending(&self) -> bool {
        self.remove(Tier::Local, keys::SELECTED_TEXT).await
    }

    /// Remove the pending selection only while it still holds `consumed`.
    ///
    /// Returns whether the key was removed.
    pub async fn clear_pending_if(&self, consumed: &str) -> bool {
        match self.load_pending().await {
            Some(pending) if pending.text.trim() == consumed.trim() => self.clear_pending().await,
            _ => false,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::BrokenStore;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_get_set_remove() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", Value::from("v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(Value::from("v")));
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let store = JsonFileStore::new(&path);
        store.set("a", Value::from(1)).await.unwrap();
        store.set("b", Value::from("two")).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("a").await.unwrap(), Some(Value::from(1)));
        reopened.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("b").await.unwrap(), Some(Value::from("two")));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get("x").await.is_err());

        // Storage hides it behind "absent".
        let storage = Storage::new(Arc::new(store), Arc::new(MemoryStore::new()));
        assert!(storage.get(Tier::Sync, "x").await.is_none());
    }

    #[tokio::test]
    async fn test_credential_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open_in(dir.path());
        let cred = Credential::new("sk-test").unwrap();
        assert!(storage.save_credential(&cred).await);

        let reopened = Storage::open_in(dir.path());
        assert_eq!(reopened.load_credential().await, Some(cred));
        // Credential lives in the synchronized tier only.
        assert!(reopened.get(Tier::Local, keys::API_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_pending_save_and_clear() {
        let storage = Storage::in_memory();
        assert!(storage.load_pending().await.is_none());
        storage
            .save_pending(&PendingSelection::new("first selection text"))
            .await;
        storage
            .save_pending(&PendingSelection::new("second selection text"))
            .await;
        assert_eq!(
            storage.load_pending().await.unwrap().text,
            "second selection text"
        );
        assert!(storage.clear_pending().await);
        assert!(storage.load_pending().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_pending_if_only_matching_text() {
        let storage = Storage::in_memory();
        storage
            .save_pending(&PendingSelection::new("staged selection text"))
            .await;

        assert!(!storage.clear_pending_if("something else entirely").await);
        assert!(storage.load_pending().await.is_some());

        assert!(storage.clear_pending_if("  staged selection text\n").await);
        assert!(storage.load_pending().await.is_none());
        assert!(!storage.clear_pending_if("staged selection text").await);
    }

    #[tokio::test]
    async fn test_broken_store_reads_as_absent() {
        let storage = Storage::new(Arc::new(BrokenStore), Arc::new(BrokenStore));
        assert!(storage.load_credential().await.is_none());
        assert!(!storage
            .save_credential(&Credential::new("sk-test").unwrap())
            .await);
        assert!(!storage.clear_pending().await);
    }

    #[test]
    fn test_store_error_maps_to_persistence() {
        let err: SummarizeError = StoreError::Unavailable("gone".into()).into();
        assert!(matches!(err, SummarizeError::Persistence(_)));
    }
}
