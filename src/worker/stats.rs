use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::JobView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    #[default]
    Idle,
    Running,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::Idle => write!(f, "IDLE"),
            WorkerStatus::Running => write!(f, "RUNNING"),
        }
    }
}

/// Counters and claim history of one worker. Only the owning worker mutates
/// it; everyone else reads published copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: u64,
    pub status: WorkerStatus,
    pub completed_count: u64,
    pub working_time: Duration,
    pub idle_time: Duration,
    /// Ids of claimed jobs, in claim order. Grows without bound.
    pub history: Vec<u64>,
}

impl WorkerStats {
    pub fn new(worker_id: u64) -> Self {
        Self {
            worker_id,
            status: WorkerStatus::Idle,
            completed_count: 0,
            working_time: Duration::ZERO,
            idle_time: Duration::ZERO,
            history: Vec::new(),
        }
    }

    pub fn record_idle(&mut self, elapsed: Duration) {
        self.idle_time += elapsed;
    }

    pub fn record_claim(&mut self, job_id: u64) {
        self.history.push(job_id);
        self.status = WorkerStatus::Running;
    }

    pub fn record_completion(&mut self, elapsed: Duration) {
        self.working_time += elapsed;
        self.completed_count += 1;
        self.status = WorkerStatus::Idle;
    }

    /// Detach the counters into a view, resolving history through `history`.
    pub fn view(&self, history: Vec<JobView>) -> WorkerStatsView {
        WorkerStatsView {
            worker_id: self.worker_id,
            status: self.status,
            completed_count: self.completed_count,
            working_time_ms: duration_ms(self.working_time),
            idle_time_ms: duration_ms(self.idle_time),
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatsView {
    pub worker_id: u64,
    pub status: WorkerStatus,
    pub completed_count: u64,
    pub working_time_ms: u64,
    pub idle_time_ms: u64,
    pub history: Vec<JobView>,
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
