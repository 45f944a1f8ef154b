/// in-memory cache store, used by tests and embedded workers
///
use async_std::sync::Mutex;
use async_trait::async_trait;
use hashbrown::HashMap;
use serde_json::Value;

use super::{CacheEntry, CacheStore};

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> MemoryCacheStore {
        MemoryCacheStore::default()
    }

    pub async fn len(&self) -> usize {
        self.map.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.lock().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.map.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, key: &str) -> Option<CacheEntry> {
        let map = self.map.lock().await;
        map.get(key).cloned().and_then(CacheEntry::from_value)
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> bool {
        let mut map = self.map.lock().await;
        map.insert(key.to_string(), entry.to_value());
        true
    }
}
