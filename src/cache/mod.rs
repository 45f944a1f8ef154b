/// long-term result cache for completed dependency scans.
///
/// The store is an interface with two backends: a json file that survives
/// process restarts, and an in-memory map for tests and embedding. Entries
/// carry their creation time and are checked against a TTL on every read;
/// stale entries are never deleted, just overwritten by the next fresh call.
///
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::envelope::TaskParameters;

pub mod file_store;
pub mod memory_store;

pub use file_store::FileCacheStore;
pub use memory_store::MemoryCacheStore;

/// cached results expire after 24 hours
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// the field holding the creation time while an entry is stored
pub const TIMESTAMP_FIELD: &str = "_cache_timestamp";

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// return the entry for key, or None if absent or unreadable
    async fn read(&self, key: &str) -> Option<CacheEntry>;

    /// store the entry under key; failures are logged and reported as false
    async fn write(&self, key: &str, entry: &CacheEntry) -> bool;
}

/// a backend payload plus the wall-clock second it was created
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: Map<String, Value>,
    pub created_at: f64,
}

impl CacheEntry {
    /// stamp a fresh payload with the current time
    pub fn new(payload: Map<String, Value>) -> CacheEntry {
        CacheEntry::with_timestamp(payload, now_secs())
    }

    pub fn with_timestamp(payload: Map<String, Value>, created_at: f64) -> CacheEntry {
        CacheEntry {
            payload,
            created_at,
        }
    }

    pub fn age_secs(&self, now: f64) -> f64 {
        now - self.created_at
    }

    /// an entry is a hit only while its age is strictly below the ttl
    pub fn is_fresh(&self, ttl: Duration, now: f64) -> bool {
        self.age_secs(now) < ttl.as_secs_f64()
    }

    /// the stored form: the payload with the timestamp field embedded
    pub fn to_value(&self) -> Value {
        let mut stored = self.payload.clone();
        stored.insert(TIMESTAMP_FIELD.to_string(), Value::from(self.created_at));
        Value::Object(stored)
    }

    /// Parse the stored form back into an entry, stripping the timestamp.
    ///
    /// Non-objects return None. An object without a numeric timestamp gets a
    /// creation time of zero so it always reads as stale.
    pub fn from_value(value: Value) -> Option<CacheEntry> {
        match value {
            Value::Object(mut payload) => {
                let created_at = payload
                    .remove(TIMESTAMP_FIELD)
                    .and_then(|ts| ts.as_f64())
                    .unwrap_or(0.0);
                Some(CacheEntry::with_timestamp(payload, created_at))
            }
            _ => None,
        }
    }

    /// consume the entry and return only the caller-facing payload
    pub fn into_payload(self) -> Value {
        Value::Object(self.payload)
    }
}

/// wall-clock seconds since the epoch, with millisecond precision
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Derive the cache key for a set of task parameters.
///
/// The format is `<dependency>_<version>_<patterns>` where patterns renders as
/// `None` when absent and as `['a', 'b']` otherwise. Keys written by earlier
/// workers use the same format, so existing cache files keep hitting. Pattern
/// lists are not normalised: a different order is a different key.
pub fn cache_key(params: &TaskParameters) -> String {
    format!(
        "{}_{}_{}",
        params.dependency,
        params.version,
        patterns_repr(params.search_patterns.as_deref())
    )
}

fn patterns_repr(patterns: Option<&[String]>) -> String {
    match patterns {
        None => "None".to_string(),
        Some(list) => {
            let items: Vec<String> = list.iter().map(|p| quote_pattern(p)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

// single quotes unless the pattern holds a ' and no ", with the chosen quote,
// backslashes and control characters escaped so distinct lists never share a key
fn quote_pattern(pattern: &str) -> String {
    let quote = if pattern.contains('\'') && !pattern.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(pattern.len() + 2);
    out.push(quote);
    for c in pattern.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
