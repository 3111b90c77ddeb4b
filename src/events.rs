//! Events published by the core for downstream observers.
//!
//! Publishing never waits on subscribers: the broadcast channel drops the
//! oldest events for a receiver that falls behind, and events sent with no
//! subscribers are discarded.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::scheduler::{JobStatus, JobView};
use crate::worker::stats::{duration_ms, WorkerStats, WorkerStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    JobCreated {
        job: JobView,
    },
    JobStateChanged {
        job_id: u64,
        status: JobStatus,
        worker_id: Option<u64>,
    },
    WorkerStatsUpdated {
        worker_id: u64,
        status: WorkerStatus,
        completed_count: u64,
        working_time_ms: u64,
        idle_time_ms: u64,
    },
}

impl DispatchEvent {
    pub fn stats_updated(stats: &WorkerStats) -> Self {
        DispatchEvent::WorkerStatsUpdated {
            worker_id: stats.worker_id,
            status: stats.status,
            completed_count: stats.completed_count,
            working_time_ms: duration_ms(stats.working_time),
            idle_time_ms: duration_ms(stats.idle_time),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: DispatchEvent) {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.tx.subscribe()
    }
}
