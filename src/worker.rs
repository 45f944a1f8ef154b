/// worker support structs
///
use serde::{Deserialize, Serialize};

pub type JsonString = String;

pub const OK: &str = "ok";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    #[default]
    Idle,
    Busy,
    Broken,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub status: String,
    pub state: WorkerState,
    pub uptime_secs: u64,
    pub processed: u64,
    pub error_count: u16,
}

impl WorkerStatus {
    pub fn new(
        worker_id: String,
        status: String,
        state: WorkerState,
        uptime_secs: u64,
        processed: u64,
        error_count: u16,
    ) -> WorkerStatus {
        WorkerStatus {
            worker_id,
            status,
            state,
            uptime_secs,
            processed,
            error_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_json() {
        let status = WorkerStatus::new(
            "WorkerAgent_Dependency".to_string(),
            OK.to_string(),
            WorkerState::Idle,
            12,
            3,
            1,
        );

        let js = serde_json::to_string(&status).unwrap();
        assert!(js.contains(r#""state":"Idle""#));

        let back: WorkerStatus = serde_json::from_str(&js).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn bounded_tests() {
        async_std::task::block_on(async move {
            let (s, r) = async_channel::bounded(2);
            assert!(r.is_empty());
            assert_eq!(s.send(10).await, Ok(()));
            assert_eq!(s.send(12).await, Ok(()));

            assert!(r.is_full());
            assert_eq!(r.recv().await, Ok(10));
            assert_eq!(r.recv().await, Ok(12));
            assert!(r.is_empty());

            assert!(s.close());
            assert!(s.is_closed());

            // closing the sender shuts down the receiver as well
            assert!(r.is_closed());
            assert!(r.recv().await.is_err());
        });
    }
}
