/// the worker agent contract and the dependency health worker that implements it
///
use anyhow::Result;
use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::FileCacheStore;
use crate::config::WorkerConfig;
use crate::dispatch::{Dispatcher, LogTransport};
use crate::envelope::{self, error_result, Envelope, ReplyEnvelope, TaskParameters};
use crate::processor::TaskProcessor;
use crate::retry::{HttpBackend, RetryExecutor};

/// What every worker agent exposes to its supervisor.
///
/// `handle_incoming_message` ties the others together: parse, validate,
/// process, reply. Implementors normally only supply the other four.
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &str;

    async fn process_task(&self, params: &TaskParameters) -> Value;

    fn validate_message(&self, message: &Value) -> Result<(), String>;

    async fn send_message(&self, recipient: &str, message: &Value) -> Result<()>;

    /// Handle one raw inbound message and return the reply envelope.
    ///
    /// Malformed messages return `{"status": "error", ...}` directly and
    /// nothing is dispatched.
    async fn handle_incoming_message(&self, raw: &str) -> Value {
        let message: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("[{}] rejected message, invalid json: {}", self.id(), e);
                return error_result(&format!("invalid json: {}", e));
            }
        };

        if let Err(reason) = self.validate_message(&message) {
            warn!("[{}] rejected message: {}", self.id(), reason);
            return error_result(&reason);
        }

        let request: Envelope = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("[{}] rejected message, bad field type: {}", self.id(), e);
                return error_result(&format!("invalid envelope: {}", e));
            }
        };

        info!(
            "[{}] received {} from {}, message id: {}",
            self.id(),
            request.task.name,
            request.sender,
            request.message_id
        );

        let result = self.process_task(&request.task.parameters).await;
        let reply = ReplyEnvelope::reply_to(&request, self.id(), result);

        let reply = match serde_json::to_value(&reply) {
            Ok(v) => v,
            Err(e) => return error_result(&format!("unable to encode reply: {}", e)),
        };

        if let Err(e) = self.send_message(&request.sender, &reply).await {
            error!("[{}] unable to deliver reply to {}: {}", self.id(), request.sender, e);
        }

        reply
    }
}

/// bridges the supervisor to the dependency analysis backend
#[derive(Clone)]
pub struct DependencyWorker {
    id: String,
    supervisor_id: String,
    processor: TaskProcessor,
    dispatcher: Dispatcher,
}

impl DependencyWorker {
    pub fn new(
        id: &str,
        supervisor_id: &str,
        processor: TaskProcessor,
        dispatcher: Dispatcher,
    ) -> DependencyWorker {
        DependencyWorker {
            id: id.to_string(),
            supervisor_id: supervisor_id.to_string(),
            processor,
            dispatcher,
        }
    }

    /// wire up the production worker: http backend, json file cache, log transport
    pub fn from_config(config: &WorkerConfig) -> Result<DependencyWorker> {
        let backend = HttpBackend::new(&config.backend_url)?;
        let executor = RetryExecutor::new(Arc::new(backend), config.retry_policy());
        let cache = FileCacheStore::new(PathBuf::from(&config.cache_file));
        let processor = TaskProcessor::with_ttl(Arc::new(cache), executor, config.cache_ttl());
        let dispatcher = Dispatcher::new(Arc::new(LogTransport::new(&config.agent_id)));

        info!(
            "worker {} configured for backend {}, cache file {}",
            config.agent_id, config.backend_url, config.cache_file
        );

        Ok(DependencyWorker::new(
            &config.agent_id,
            &config.supervisor_id,
            processor,
            dispatcher,
        ))
    }

    pub fn supervisor_id(&self) -> &str {
        &self.supervisor_id
    }
}

#[async_trait]
impl Agent for DependencyWorker {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process_task(&self, params: &TaskParameters) -> Value {
        self.processor.process(params).await
    }

    fn validate_message(&self, message: &Value) -> Result<(), String> {
        envelope::validate(message)
    }

    async fn send_message(&self, recipient: &str, message: &Value) -> Result<()> {
        self.dispatcher.dispatch(recipient, message).await
    }
}
