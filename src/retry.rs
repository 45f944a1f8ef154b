/// outbound calls to the analysis backend, wrapped in a bounded retry policy.
///
/// Transport failures (connect errors, timeouts, non-success statuses) are
/// retried with linear backoff until the budget runs out. A body that is not a
/// json object fails immediately; retrying will not fix it.
///
use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::BackendError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// limit on each individual attempt
    pub timeout: Duration,
    /// additional attempts after the first
    pub max_retries: u32,
    /// the wait after attempt n is backoff_step * n
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32, backoff_step: Duration) -> RetryPolicy {
        RetryPolicy {
            timeout,
            max_retries,
            backoff_step,
        }
    }

    /// total attempts, including the first
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// the wait after the given (1-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }
}

/// a single request/response exchange with the analysis service
#[async_trait]
pub trait Backend: Send + Sync {
    async fn post(&self, payload: &Value, timeout: Duration) -> Result<Value, BackendError>;
}

/// the production backend: json over http POST
#[derive(Debug, Clone)]
pub struct HttpBackend {
    url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(url: &str) -> anyhow::Result<HttpBackend> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dependency-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpBackend {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn exchange(&self, payload: &Value) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Transient(format!(
                "backend returned status {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        parse_body(&body)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn post(&self, payload: &Value, timeout: Duration) -> Result<Value, BackendError> {
        match async_std::future::timeout(timeout, self.exchange(payload)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transient(format!(
                "request to {} timed out after {:?}",
                self.url, timeout
            ))),
        }
    }
}

/// the backend must answer with a json object; anything else is malformed
pub fn parse_body(body: &[u8]) -> Result<Value, BackendError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(BackendError::Malformed(format!(
            "expected a json object, got: {}",
            other
        ))),
        Err(e) => Err(BackendError::Malformed(e.to_string())),
    }
}

#[derive(Clone)]
pub struct RetryExecutor {
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(backend: Arc<dyn Backend>, policy: RetryPolicy) -> RetryExecutor {
        RetryExecutor { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Post the payload, retrying transient failures.
    ///
    /// Returns the first successful response, the first malformed-response
    /// error, or the last transient error once every attempt has failed.
    pub async fn call(&self, payload: &Value) -> Result<Value, BackendError> {
        let attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            match self.backend.post(payload, self.policy.timeout).await {
                Ok(response) => {
                    debug!("backend call succeeded on attempt {}/{}", attempt, attempts);
                    return Ok(response);
                }
                Err(e) if !e.is_retriable() => {
                    error!("backend call failed without retry: {}", e);
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    error!("backend call failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, attempts, e, delay
                    );
                    async_std::task::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
