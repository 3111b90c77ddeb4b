use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// How the work queue tells idle workers that a job may be waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignalPolicy {
    /// A monitor task checks the queue depth once per tick and wakes at most
    /// one worker when it is non-empty. Jobs that arrive in a burst are picked
    /// up one tick at a time unless a worker re-checks on its own.
    #[default]
    Periodic,
    /// Every enqueue wakes one waiting worker immediately. No monitor task.
    OnEnqueue,
}

/// Parameters of the simulated job execution.
///
/// A job sleeps once per input character for a random duration drawn from
/// `step_delay_min_ms..=step_delay_max_ms` and adds `result_step` to its
/// result each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkConfig {
    pub step_delay_min_ms: u64,
    pub step_delay_max_ms: u64,
    pub result_step: u64,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            step_delay_min_ms: 0,
            step_delay_max_ms: 999,
            result_step: 10,
        }
    }
}

impl WorkConfig {
    /// Fixed per-character delay, handy for deterministic tests.
    pub fn fixed(step_delay_ms: u64) -> Self {
        Self {
            step_delay_min_ms: step_delay_ms,
            step_delay_max_ms: step_delay_ms,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of workers in the pool. Fixed for the pool's lifetime.
    pub worker_count: usize,
    /// Tick period of the queue monitor under [`SignalPolicy::Periodic`].
    pub queue_check_interval_ms: u64,
    pub signal_policy: SignalPolicy,
    pub work: WorkConfig,
    /// Capacity of the event broadcast channel. Slow subscribers lose the
    /// oldest events once it fills up.
    pub event_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_check_interval_ms: 500,
            signal_policy: SignalPolicy::Periodic,
            work: WorkConfig::default(),
            event_capacity: 1024,
        }
    }
}

impl DispatcherConfig {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    pub fn with_signal_policy(mut self, policy: SignalPolicy) -> Self {
        self.signal_policy = policy;
        self
    }

    pub fn with_queue_check_interval_ms(mut self, interval_ms: u64) -> Self {
        self.queue_check_interval_ms = interval_ms;
        self
    }

    pub fn with_work(mut self, work: WorkConfig) -> Self {
        self.work = work;
        self
    }

    /// Reject configurations the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(DispatchError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.signal_policy == SignalPolicy::Periodic && self.queue_check_interval_ms == 0 {
            return Err(DispatchError::InvalidConfig(
                "queue_check_interval_ms must be positive with the periodic signal policy"
                    .to_string(),
            ));
        }
        if self.work.step_delay_min_ms > self.work.step_delay_max_ms {
            return Err(DispatchError::InvalidConfig(format!(
                "step delay range is empty: {}..={}",
                self.work.step_delay_min_ms, self.work.step_delay_max_ms
            )));
        }
        if self.event_capacity == 0 {
            return Err(DispatchError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
