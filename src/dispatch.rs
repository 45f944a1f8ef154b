/// delivery of reply envelopes through an injected transport
///
use anyhow::Result;
use async_channel::Sender;
use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::sync::Arc;

use crate::worker::JsonString;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, recipient: &str, envelope: &Value) -> Result<()>;
}

/// writes each envelope to the log; the default console side channel
#[derive(Debug, Default, Clone)]
pub struct LogTransport {
    pub sender_id: String,
}

impl LogTransport {
    pub fn new(sender_id: &str) -> LogTransport {
        LogTransport {
            sender_id: sender_id.to_string(),
        }
    }
}

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, recipient: &str, envelope: &Value) -> Result<()> {
        let js = serde_json::to_string_pretty(envelope)?;
        info!("[{}] sending message to {}:\n{}", self.sender_id, recipient, js);
        Ok(())
    }
}

/// forwards (recipient, json) pairs to a supervisor-facing channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<(String, JsonString)>,
}

impl ChannelTransport {
    pub fn new(tx: Sender<(String, JsonString)>) -> ChannelTransport {
        ChannelTransport { tx }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn deliver(&self, recipient: &str, envelope: &Value) -> Result<()> {
        let js = serde_json::to_string(envelope)?;
        self.tx.send((recipient.to_string(), js)).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Dispatcher {
        Dispatcher { transport }
    }

    pub async fn dispatch(&self, recipient: &str, envelope: &Value) -> Result<()> {
        self.transport.deliver(recipient, envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_delivery() {
        async_std::task::block_on(async move {
            let (tx, rx) = async_channel::bounded(4);
            let dispatcher = Dispatcher::new(Arc::new(ChannelTransport::new(tx)));

            let envelope = json!({"message_id": "task123", "type": "task_result"});
            assert!(dispatcher.dispatch("SupervisorAgent_Main", &envelope).await.is_ok());

            let (recipient, js) = rx.recv().await.expect("should receive the envelope");
            assert_eq!(recipient, "SupervisorAgent_Main");
            assert_eq!(serde_json::from_str::<Value>(&js).unwrap(), envelope);
        });
    }

    #[test]
    fn closed_channel_is_an_error() {
        async_std::task::block_on(async move {
            let (tx, rx) = async_channel::bounded(1);
            rx.close();

            let dispatcher = Dispatcher::new(Arc::new(ChannelTransport::new(tx)));
            assert!(dispatcher.dispatch("nobody", &json!({})).await.is_err());
        });
    }

    #[test]
    fn log_delivery() {
        async_std::task::block_on(async move {
            let dispatcher = Dispatcher::new(Arc::new(LogTransport::new("WorkerAgent_Dependency")));
            assert!(dispatcher.dispatch("SupervisorAgent_Main", &json!({"ok": true})).await.is_ok());
        });
    }
}
