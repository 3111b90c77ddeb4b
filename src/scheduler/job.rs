use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{DispatchError, Result};

/// A job shared between the ledger, the work queue and the worker that claims it.
pub type SharedJob = Arc<RwLock<Job>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Complete => write!(f, "COMPLETE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    id: u64,
    input_param: String,
    status: JobStatus,
    assigned_worker: Option<u64>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<u64>,
}

impl Job {
    pub fn new(id: u64, input_param: String) -> Self {
        Self::with_created_at(id, input_param, Utc::now())
    }

    pub fn with_created_at(id: u64, input_param: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            input_param,
            status: JobStatus::Pending,
            assigned_worker: None,
            created_at,
            started_at: None,
            completed_at: None,
            result: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn input_param(&self) -> &str {
        &self.input_param
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn assigned_worker(&self) -> Option<u64> {
        self.assigned_worker
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The result is only visible once the job is complete.
    pub fn result(&self) -> Option<u64> {
        self.result
    }

    /// PENDING -> RUNNING. Timestamps never go backwards even if the wall
    /// clock does.
    pub fn start(&mut self, worker_id: u64, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Running)?;
        self.assigned_worker = Some(worker_id);
        self.started_at = Some(at.max(self.created_at));
        Ok(())
    }

    /// RUNNING -> COMPLETE.
    pub fn complete(&mut self, result: u64, at: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Complete)?;
        let started = self.started_at.unwrap_or(self.created_at);
        self.completed_at = Some(at.max(started));
        self.result = Some(result);
        Ok(())
    }

    fn transition(&mut self, to: JobStatus) -> Result<()> {
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Pending, JobStatus::Running) | (JobStatus::Running, JobStatus::Complete)
        );
        if !allowed {
            return Err(DispatchError::InvalidTransition {
                job_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            status: self.status,
            assigned_worker: self.assigned_worker,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            input_param: self.input_param.clone(),
            result: self.result,
        }
    }
}

/// Immutable copy of a job handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub id: u64,
    pub status: JobStatus,
    pub assigned_worker: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_param: String,
    pub result: Option<u64>,
}

impl JobView {
    /// Table cells in display order: id, worker, status, created, started,
    /// completed, input, result. Unset values render as "-".
    pub fn cells(&self) -> [String; 8] {
        [
            self.id.to_string(),
            or_dash(self.assigned_worker),
            self.status.to_string(),
            format_time(Some(self.created_at)),
            format_time(self.started_at),
            format_time(self.completed_at),
            self.input_param.clone(),
            or_dash(self.result),
        ]
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".to_string(),
        |t| t.format("%H:%M:%S%.3f").to_string(),
    )
}
