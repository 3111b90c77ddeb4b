use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::events::{DispatchEvent, EventBus};
use crate::scheduler::{JobStatus, WorkQueue};
use crate::worker::executor::JobExecutor;
use crate::worker::stats::WorkerStats;

/// What a single pass through the worker loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Woke up but the queue was empty. Counted as idle time.
    Idle,
    /// Claimed and finished the job with this id.
    Completed(u64),
    /// Dequeued a job that was not pending. Nothing was executed.
    Rejected(u64),
}

/// A long-lived execution loop that claims jobs from the queue and runs them.
///
/// The worker is the only writer of its [`WorkerStats`]. Every change is
/// published through a watch channel, so readers get a consistent copy of the
/// counters without ever holding up the worker.
pub struct Worker {
    id: u64,
    queue: Arc<WorkQueue>,
    executor: JobExecutor,
    stats: watch::Sender<WorkerStats>,
    events: EventBus,
}

impl Worker {
    pub fn new(
        id: u64,
        queue: Arc<WorkQueue>,
        executor: JobExecutor,
        events: EventBus,
    ) -> (Self, watch::Receiver<WorkerStats>) {
        let (stats, stats_rx) = watch::channel(WorkerStats::new(id));
        let worker = Self {
            id,
            queue,
            executor,
            stats,
            events,
        };
        (worker, stats_rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run forever.
    pub async fn run(self) {
        tracing::info!(worker_id = self.id, "Worker started");
        loop {
            self.step().await;
        }
    }

    /// One pass of the loop: wait for a signal, try to take a job, and run it
    /// to completion if there was one.
    pub async fn step(&self) -> StepOutcome {
        let idle_started = Instant::now();
        self.queue.wait_for_availability().await;

        let Some(job) = self.queue.try_dequeue().await else {
            let idle = idle_started.elapsed();
            self.update_stats(|stats| stats.record_idle(idle));
            return StepOutcome::Idle;
        };

        let (job_id, input) = {
            let mut job = job.write().await;
            if let Err(e) = job.start(self.id, Utc::now()) {
                tracing::error!(worker_id = self.id, error = %e, "Dequeued a job that is not pending");
                return StepOutcome::Rejected(job.id());
            }
            (job.id(), job.input_param().to_string())
        };

        self.update_stats(|stats| stats.record_claim(job_id));
        self.events.publish(DispatchEvent::JobStateChanged {
            job_id,
            status: JobStatus::Running,
            worker_id: Some(self.id),
        });
        tracing::info!(worker_id = self.id, job_id, input = %input, "Processing job");

        let outcome = self.executor.execute(job_id, &input).await;

        if let Err(e) = job.write().await.complete(outcome.result, Utc::now()) {
            tracing::error!(worker_id = self.id, error = %e, "Failed to mark job complete");
        }

        self.update_stats(|stats| stats.record_completion(outcome.elapsed));
        self.events.publish(DispatchEvent::JobStateChanged {
            job_id,
            status: JobStatus::Complete,
            worker_id: Some(self.id),
        });
        tracing::info!(
            worker_id = self.id,
            job_id,
            result = outcome.result,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Job completed"
        );

        StepOutcome::Completed(job_id)
    }

    fn update_stats(&self, f: impl FnOnce(&mut WorkerStats)) {
        self.stats.send_modify(f);
        let event = DispatchEvent::stats_updated(&self.stats.borrow());
        self.events.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SignalPolicy, WorkConfig};
    use crate::scheduler::JobLedger;
    use crate::worker::stats::WorkerStatus;
    use std::time::Duration;

    fn setup(policy: SignalPolicy) -> (Worker, watch::Receiver<WorkerStats>, Arc<WorkQueue>) {
        let queue = Arc::new(WorkQueue::new(policy));
        let (worker, stats) = Worker::new(
            1,
            queue.clone(),
            JobExecutor::new(WorkConfig::fixed(10)),
            EventBus::new(64),
        );
        (worker, stats, queue)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_job_to_completion() {
        let (worker, stats, queue) = setup(SignalPolicy::OnEnqueue);
        let ledger = JobLedger::new();
        let job = ledger.create("abc".to_string()).await;
        queue.enqueue(job.clone()).await;

        assert_eq!(worker.step().await, StepOutcome::Completed(1));

        let job = job.read().await;
        assert_eq!(job.status(), JobStatus::Complete);
        assert_eq!(job.assigned_worker(), Some(1));
        assert_eq!(job.result(), Some(30));
        assert!(job.created_at() <= job.started_at().unwrap());
        assert!(job.started_at().unwrap() <= job.completed_at().unwrap());

        let stats = stats.borrow();
        assert_eq!(stats.status, WorkerStatus::Idle);
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.history, vec![1]);
        assert!(stats.working_time >= Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_wake_counts_as_idle() {
        let (worker, stats, queue) = setup(SignalPolicy::Periodic);

        let signaller = tokio::spawn({
            let queue = queue.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                // Leave a job for the signal, then take it back before the
                // worker gets to run.
                let ledger = JobLedger::new();
                queue.enqueue(ledger.create("x".to_string()).await).await;
                queue.signal_if_pending().await;
                queue.try_dequeue().await;
            }
        });

        assert_eq!(worker.step().await, StepOutcome::Idle);
        signaller.await.unwrap();

        let stats = stats.borrow();
        assert_eq!(stats.completed_count, 0);
        assert!(stats.history.is_empty());
        assert!(stats.idle_time >= Duration::from_millis(200));
        assert_eq!(stats.working_time, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_job_that_is_already_claimed() {
        let (worker, stats, queue) = setup(SignalPolicy::OnEnqueue);
        let ledger = JobLedger::new();
        let job = ledger.create("abc".to_string()).await;
        job.write().await.start(9, Utc::now()).unwrap();
        queue.enqueue(job.clone()).await;

        assert_eq!(worker.step().await, StepOutcome::Rejected(1));
        assert_eq!(job.read().await.assigned_worker(), Some(9));
        assert!(stats.borrow().history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_lifecycle_events() {
        let queue = Arc::new(WorkQueue::new(SignalPolicy::OnEnqueue));
        let events = EventBus::new(64);
        let mut rx = events.subscribe();
        let (worker, _stats) = Worker::new(
            4,
            queue.clone(),
            JobExecutor::new(WorkConfig::fixed(1)),
            events,
        );
        let ledger = JobLedger::new();
        queue.enqueue(ledger.create("a".to_string()).await).await;

        worker.step().await;

        let mut states = Vec::new();
        let mut stats_updates = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                DispatchEvent::JobStateChanged {
                    status, worker_id, ..
                } => {
                    assert_eq!(worker_id, Some(4));
                    states.push(status);
                }
                DispatchEvent::WorkerStatsUpdated { .. } => stats_updates += 1,
                DispatchEvent::JobCreated { .. } => {}
            }
        }
        assert_eq!(states, vec![JobStatus::Running, JobStatus::Complete]);
        assert_eq!(stats_updates, 2);
    }
}
