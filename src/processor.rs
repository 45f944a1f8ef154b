/// cache-aware task execution: ttl lookup, backend call on miss, cache population on success.
///
use log::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{cache_key, now_secs, CacheEntry, CacheStore, DEFAULT_TTL};
use crate::envelope::{error_result, TaskParameters};
use crate::retry::RetryExecutor;

#[derive(Clone)]
pub struct TaskProcessor {
    cache: Arc<dyn CacheStore>,
    executor: RetryExecutor,
    ttl: Duration,
}

impl TaskProcessor {
    pub fn new(cache: Arc<dyn CacheStore>, executor: RetryExecutor) -> TaskProcessor {
        TaskProcessor::with_ttl(cache, executor, DEFAULT_TTL)
    }

    pub fn with_ttl(
        cache: Arc<dyn CacheStore>,
        executor: RetryExecutor,
        ttl: Duration,
    ) -> TaskProcessor {
        TaskProcessor {
            cache,
            executor,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Run one task.
    ///
    /// Returns the backend payload, either from a fresh cache entry or from a
    /// new backend call, or `{"status": "error", "message": ...}` when the call
    /// fails. Failed calls are never cached.
    pub async fn process(&self, params: &TaskParameters) -> Value {
        let key = cache_key(params);

        if let Some(entry) = self.cache.read(&key).await {
            if entry.is_fresh(self.ttl, now_secs()) {
                info!("cache hit for key: {}", key);
                return entry.into_payload();
            }
            info!("cache entry expired for key: {}", key);
        }

        let payload = backend_request(params);
        info!("sending scan request to backend for key: {}", key);

        match self.executor.call(&payload).await {
            Ok(Value::Object(response)) => self.store(&key, response).await,
            Ok(other) => {
                // backends behind the trait may skip the object check
                error_result(&format!("backend request failed: expected a json object, got: {}", other))
            }
            Err(e) => {
                error!("task failed for key {}: {}", key, e);
                error_result(&format!("backend request failed: {}", e))
            }
        }
    }

    async fn store(&self, key: &str, response: Map<String, Value>) -> Value {
        let entry = CacheEntry::new(response);
        if !self.cache.write(key, &entry).await {
            warn!("result for key {} was not cached", key);
        }

        entry.into_payload()
    }
}

/// the request body: `{"dependencies": {name: version}}` plus any search patterns;
/// an empty pattern list is left out, same as no list at all
pub fn backend_request(params: &TaskParameters) -> Value {
    let mut dependencies = Map::new();
    dependencies.insert(
        params.dependency.clone(),
        Value::String(params.version.clone()),
    );

    let mut payload = json!({ "dependencies": dependencies });
    if let Some(patterns) = params.search_patterns.as_ref().filter(|p| !p.is_empty()) {
        payload["search_patterns"] = json!(patterns);
    }

    payload
}
