/// start a dependency worker, assign it one health check and log the reply.
///
/// usage: dependency-worker [config.json]
///
use anyhow::Result;
use dependency_worker::agent::DependencyWorker;
use dependency_worker::config::WorkerConfig;
use dependency_worker::handler::WorkerHandle;
use dependency_worker::supervisor::Supervisor;
use dependency_worker::{logging, VERSION};
use log::*;
use std::sync::Arc;

#[async_std::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1);
    let config = WorkerConfig::load(path.as_deref())?;

    logging::init(config.level_filter())?;
    info!("dependency worker version: {}", VERSION);

    let agent = DependencyWorker::from_config(&config)?;
    let worker = WorkerHandle::new(Arc::new(agent)).await;
    let supervisor = Supervisor::new(&config.supervisor_id, worker);

    let reply = supervisor.assign_task("react", "^18.0.0", None).await?;
    info!("reply: {}", serde_json::to_string_pretty(&reply)?);

    let status = supervisor.status().await?;
    info!("worker status: {:?}", status);

    supervisor.shutdown().await
}
