/// json file backed cache store; the whole mapping is loaded and saved on every access.
///
use async_std::path::PathBuf;
use async_std::sync::Mutex;
use async_trait::async_trait;
use log::*;
use serde_json::{Map, Value};
use std::io::ErrorKind;

use super::{CacheEntry, CacheStore};
use crate::errors::CacheError;

#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    // serialises the load-modify-save cycle within this process
    write_lock: Mutex<()>,
}

impl FileCacheStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileCacheStore {
        FileCacheStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// load the full mapping; a missing file is an empty mapping
    pub async fn load(&self) -> Result<Map<String, Value>, CacheError> {
        let text = match async_std::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(CacheError::NotAnObject),
        }
    }

    async fn save(&self, map: &Map<String, Value>) -> Result<(), CacheError> {
        let js = serde_json::to_string_pretty(map)?;

        // write then rename so a crash never leaves a half written file
        let tmp = self.path.with_extension("tmp");

        async_std::fs::write(&tmp, js).await?;
        if let Err(e) = async_std::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = async_std::fs::remove_file(&tmp).await {
                warn!("could not remove temp cache file {:?}: {}", tmp, cleanup);
            }
            return Err(e.into());
        }

        Ok(())
    }

    async fn try_write(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), entry.to_value());
        self.save(&map).await
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self, key: &str) -> Option<CacheEntry> {
        match self.load().await {
            Ok(mut map) => map.remove(key).and_then(CacheEntry::from_value),
            Err(e) => {
                warn!("cache read from {:?} failed, treating as empty: {}", self.path, e);
                None
            }
        }
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> bool {
        match self.try_write(key, entry).await {
            Ok(()) => {
                debug!("cached key: {}", key);
                true
            }
            Err(e) => {
                error!("cache write error for key {}: {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(created_at: f64) -> CacheEntry {
        let payload = json!({"vulnerabilities": [], "score": 92});
        CacheEntry::with_timestamp(payload.as_object().unwrap().clone(), created_at)
    }

    #[test]
    fn missing_file_is_empty() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            let store = FileCacheStore::new(dir.path().join("ltm_cache.json"));

            assert!(store.load().await.unwrap().is_empty());
            assert!(store.read("axios_^1.5.0_None").await.is_none());
        });
    }

    #[test]
    fn write_then_read() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            let store = FileCacheStore::new(dir.path().join("ltm_cache.json"));

            let key = "axios_^1.5.0_['*.js']";
            assert!(store.write(key, &entry(1_700_000_000.0)).await);
            assert!(store.write("react_^18.0.0_None", &entry(1_700_000_100.0)).await);

            let found = store.read(key).await.expect("entry should be cached");
            assert_eq!(found, entry(1_700_000_000.0));

            // the file itself is a single json object keyed by cache key
            let text = std::fs::read_to_string(dir.path().join("ltm_cache.json")).unwrap();
            let stored: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(stored.as_object().unwrap().len(), 2);
            assert_eq!(stored[key]["_cache_timestamp"], json!(1_700_000_000.0));
            assert_eq!(stored[key]["score"], json!(92));
        });
    }

    #[test]
    fn overwrite_replaces_entry() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            let store = FileCacheStore::new(dir.path().join("ltm_cache.json"));

            assert!(store.write("k", &entry(1.0)).await);
            assert!(store.write("k", &entry(2.0)).await);

            assert_eq!(store.read("k").await.unwrap().created_at, 2.0);
            assert_eq!(store.load().await.unwrap().len(), 1);
        });
    }

    #[test]
    fn corrupt_file_degrades() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("ltm_cache.json");
            std::fs::write(&path, "{ not json").unwrap();

            let store = FileCacheStore::new(path);
            assert!(store.read("k").await.is_none());
            assert!(!store.write("k", &entry(1.0)).await);
        });
    }

    #[test]
    fn unwritable_path_reports_false() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            let store = FileCacheStore::new(dir.path().join("missing-dir").join("ltm_cache.json"));

            assert!(!store.write("k", &entry(1.0)).await);
        });
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        async_std::task::block_on(async move {
            let dir = tempfile::tempdir().unwrap();
            // a non-empty directory at the target path makes the rename fail
            let path = dir.path().join("ltm_cache.json");
            std::fs::create_dir(&path).unwrap();
            std::fs::write(path.join("keep"), "x").unwrap();

            let store = FileCacheStore::new(path.clone());
            assert!(store.save(&Map::new()).await.is_err());
            assert!(!path.with_extension("tmp").exists());
            assert!(path.is_dir());
        });
    }
}
