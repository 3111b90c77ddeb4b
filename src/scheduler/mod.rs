//! Job model and the shared structures jobs pass through on their way to a
//! worker: the ledger (every job ever submitted), the work queue (jobs still
//! waiting) and the periodic queue monitor.

pub mod job;
pub mod ledger;
pub mod monitor;
pub mod queue;

pub use job::{Job, JobStatus, JobView, SharedJob};
pub use ledger::JobLedger;
pub use monitor::QueueMonitor;
pub use queue::WorkQueue;
