/// the worker's command loop and the handle used to talk to it.
///
/// Messages are handled one at a time in arrival order, so a worker never
/// races itself on the cache's load-modify-save cycle.
///
use anyhow::{anyhow, Result};
use async_channel::{bounded, Receiver, Sender};
use log::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::agent::Agent;
use crate::worker::{JsonString, WorkerState, WorkerStatus, OK};

#[derive(Debug, Clone)]
pub enum Command {
    Message(JsonString, Sender<JsonString>), // an inbound envelope and where to send the reply
    Status(Sender<JsonString>),              // request the worker's status
    Shutdown,
}

/// true if the reply (or its embedded result) carries status "error"
pub fn is_error_reply(reply: &Value) -> bool {
    reply["status"] == "error" || reply["result"]["status"] == "error"
}

// the handler loop
pub async fn handler(agent: Arc<dyn Agent>, rx: Receiver<Command>) -> Result<()> {
    let id = agent.id().to_string();
    let started = Instant::now();
    let mut state = WorkerState::Idle;
    let mut processed = 0u64;
    let mut error_count = 0u16;

    // now read and respond to requests
    while let Ok(cmd) = rx.recv().await {
        match cmd {
            Command::Message(raw, tx) => {
                debug!("recv message: {}", raw);
                state = WorkerState::Busy;

                let reply = agent.handle_incoming_message(&raw).await;
                processed += 1;
                if is_error_reply(&reply) {
                    error_count = error_count.saturating_add(1);
                }

                if tx.send(reply.to_string()).await.is_err() {
                    error_count = error_count.saturating_add(1);
                    error!("error returning reply to channel: {:?}", tx);
                }

                state = WorkerState::Idle;
            }
            Command::Status(tx) => {
                let status = WorkerStatus::new(
                    id.clone(),
                    OK.to_string(),
                    state.clone(),
                    started.elapsed().as_secs(),
                    processed,
                    error_count,
                );

                let msg = match serde_json::to_string(&status) {
                    Ok(js) => js,
                    Err(e) => {
                        format!(r#"{}"status":"json parse error: {:?}"{}"#, "{", e, "}\n")
                    }
                };

                info!("status response: {}", msg);
                if tx.send(msg).await.is_err() {
                    error_count = error_count.saturating_add(1);
                    error!("error returning status to channel: {:?}", tx);
                }
            }
            Command::Shutdown => {
                state = WorkerState::Shutdown;
                info!("worker id: {}, state: {:?}", id, state);
                break;
            }
        }
    }

    rx.close();

    Ok(())
}

#[derive(Debug, Clone)]
pub struct WorkerHandle {
    id: String,
    started: Instant,
    request_tx: Sender<Command>,
}

impl WorkerHandle {
    /// start the handler loop for this agent as a background task.
    pub async fn new(agent: Arc<dyn Agent>) -> WorkerHandle {
        let id = agent.id().to_string();
        let wid = id.clone();

        info!("starting up worker, id: {}", id);

        let (request_tx, request_receiver) = bounded(250);

        // run the handler loop as a background task
        async_std::task::spawn(async move {
            match handler(agent, request_receiver).await {
                Ok(()) => info!("worker handler exit for worker id: {}", id),
                Err(e) => error!("worker exit with error: {:?}", e),
            }
        });

        WorkerHandle {
            id: wid,
            started: Instant::now(),
            request_tx,
        }
    }

    /// return the worker's id
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    /// return the number of seconds this handle has been alive
    pub fn get_uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// This is invoked by the client to enable sending command request to
    /// the worker
    pub fn request_channel(&self) -> Sender<Command> {
        self.request_tx.clone()
    }

    /// send a raw envelope and wait for the reply
    pub async fn send(&self, raw: &str) -> Result<Value> {
        let (responder, rx) = bounded(1);
        self.request_tx
            .send(Command::Message(raw.to_string(), responder))
            .await
            .map_err(|_| anyhow!("worker {} is not accepting messages", self.id))?;

        let reply = rx.recv().await?;
        Ok(serde_json::from_str(&reply)?)
    }

    pub async fn status(&self) -> Result<WorkerStatus> {
        let (responder, rx) = bounded(1);
        self.request_tx
            .send(Command::Status(responder))
            .await
            .map_err(|_| anyhow!("worker {} is not accepting requests", self.id))?;

        let js = rx.recv().await?;
        Ok(serde_json::from_str(&js)?)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| anyhow!("worker {} already stopped", self.id))
    }
}
