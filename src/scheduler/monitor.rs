use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::scheduler::queue::WorkQueue;

/// Periodically checks the work queue and wakes one idle worker when jobs are
/// waiting.
///
/// At most one worker is woken per tick regardless of the queue depth, so a
/// burst of jobs drains at one claim per tick until workers happen to re-check.
pub struct QueueMonitor {
    interval: Duration,
}

impl QueueMonitor {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run forever. The first check happens one full interval after start.
    pub async fn run(&self, queue: Arc<WorkQueue>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if queue.signal_if_pending().await {
                tracing::trace!("Queue monitor signalled a worker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalPolicy;
    use crate::scheduler::Job;
    use tokio::sync::RwLock;

    #[tokio::test(start_paused = true)]
    async fn signals_once_per_tick_when_pending() {
        let queue = Arc::new(WorkQueue::new(SignalPolicy::Periodic));
        queue
            .enqueue(Arc::new(RwLock::new(Job::new(1, "a".to_string()))))
            .await;

        let monitor = QueueMonitor::new(100);
        let task = tokio::spawn({
            let queue = queue.clone();
            async move { monitor.run(queue).await }
        });

        let started = Instant::now();
        queue.wait_for_availability().await;
        assert!(started.elapsed() >= Duration::from_millis(100));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn stays_quiet_when_queue_empty() {
        let queue = Arc::new(WorkQueue::new(SignalPolicy::Periodic));
        let monitor = QueueMonitor::new(10);
        let task = tokio::spawn({
            let queue = queue.clone();
            async move { monitor.run(queue).await }
        });

        let woke = tokio::time::timeout(Duration::from_millis(500), queue.wait_for_availability())
            .await
            .is_ok();
        assert!(!woke);

        task.abort();
    }
}
