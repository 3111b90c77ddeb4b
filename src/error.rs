use thiserror::Error;

use crate::scheduler::JobStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Input parameter empty: specify a value to create a valid job")]
    EmptyInput,

    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: u64,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job not found: {0}")]
    JobNotFound(u64),

    #[error("Worker not found: {0}")]
    WorkerNotFound(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
