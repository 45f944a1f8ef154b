/// supervising-side stub: builds task assignments and hands them to a worker
///
use anyhow::Result;
use log::*;
use serde_json::Value;

use crate::envelope::{now_rfc3339, Envelope, Task, TaskParameters, TASK_ASSIGNMENT};
use crate::handler::WorkerHandle;
use crate::worker::WorkerStatus;

pub const HEALTH_CHECK_TASK: &str = "dependency_health_check";

#[derive(Debug, Clone)]
pub struct Supervisor {
    pub id: String,
    pub worker: WorkerHandle,
}

impl Supervisor {
    pub fn new(id: &str, worker: WorkerHandle) -> Supervisor {
        Supervisor {
            id: id.to_string(),
            worker,
        }
    }

    /// build a task_assignment envelope addressed to this supervisor's worker
    pub fn build_assignment(&self, params: TaskParameters) -> Envelope {
        Envelope {
            message_id: Value::String(format!("task{:06}", fastrand::u32(0..1_000_000))),
            sender: self.id.clone(),
            recipient: self.worker.id(),
            kind: TASK_ASSIGNMENT.to_string(),
            task: Task {
                name: HEALTH_CHECK_TASK.to_string(),
                parameters: params,
            },
            timestamp: Value::String(now_rfc3339()),
        }
    }

    /// assign a health check and wait for the worker's reply
    pub async fn assign_task(
        &self,
        dependency: &str,
        version: &str,
        search_patterns: Option<Vec<String>>,
    ) -> Result<Value> {
        let envelope =
            self.build_assignment(TaskParameters::new(dependency, version, search_patterns));
        info!(
            "assigning {} {}@{} to {}",
            envelope.message_id, dependency, version, envelope.recipient
        );

        let raw = serde_json::to_string(&envelope)?;
        self.worker.send(&raw).await
    }

    pub async fn status(&self) -> Result<WorkerStatus> {
        self.worker.status().await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.worker.shutdown().await
    }
}
