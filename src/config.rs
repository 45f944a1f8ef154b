/// worker configuration, loaded from an optional json file over built-in defaults
///
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub agent_id: String,
    pub supervisor_id: String,
    pub backend_url: String,
    pub cache_file: String,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_step_ms: u64,
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            agent_id: "WorkerAgent_Dependency".to_string(),
            supervisor_id: "SupervisorAgent_Main".to_string(),
            backend_url: "http://localhost:4000/api/dependencies/analyze".to_string(),
            cache_file: "ltm_cache.json".to_string(),
            cache_ttl_secs: 24 * 60 * 60,
            timeout_secs: 3,
            max_retries: 2,
            backoff_step_ms: 300,
            log_level: "info".to_string(),
        }
    }
}

impl WorkerConfig {
    /// read a json config file; fields left out keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<WorkerConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// defaults unless a path is given
    pub fn load(path: Option<&str>) -> Result<WorkerConfig, ConfigError> {
        match path {
            Some(p) => WorkerConfig::from_file(p),
            None => Ok(WorkerConfig::default()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.timeout_secs),
            self.max_retries,
            Duration::from_millis(self.backoff_step_ms),
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
