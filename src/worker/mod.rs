//! Worker execution engine.
//!
//! # Components
//!
//! - [`Worker`]: the claim/execute loop bound to one worker id
//! - [`JobExecutor`]: the simulated, variable-latency workload
//! - [`WorkerStats`]: per-worker counters and claim history
//!
//! # Execution Flow
//!
//! 1. Worker waits for an availability signal from the [`WorkQueue`](crate::scheduler::WorkQueue)
//! 2. Tries to dequeue; an empty queue just adds to idle time
//! 3. Marks the job RUNNING and records the claim
//! 4. [`JobExecutor::execute`] runs the workload
//! 5. Marks the job COMPLETE and updates working time and completed count

pub mod executor;
pub mod runner;
pub mod stats;

pub use executor::{ExecutionResult, JobExecutor};
pub use runner::{StepOutcome, Worker};
pub use stats::{WorkerStats, WorkerStatsView, WorkerStatus};
