use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::{DispatcherConfig, SignalPolicy};
use crate::error::{DispatchError, Result};
use crate::events::{DispatchEvent, EventBus};
use crate::scheduler::{JobLedger, JobView, QueueMonitor, WorkQueue};
use crate::worker::{JobExecutor, Worker, WorkerStats, WorkerStatsView, WorkerStatus};

/// Point-in-time view of the ledger and every worker.
///
/// Jobs and workers are read one after another without a global lock, so the
/// two halves can disagree momentarily (a job may show RUNNING before its
/// worker's history lists it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub jobs: Vec<JobView>,
    pub workers: Vec<WorkerStatsView>,
}

/// Pool-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_jobs: usize,
    pub pending_jobs: usize,
    pub running_jobs: usize,
    pub completed_jobs: u64,
}

/// Owns the work queue, the job ledger and the worker pool.
///
/// [`Dispatcher::submit_job`] is the only way to create work. Everything else
/// is read-only observation.
pub struct Dispatcher {
    config: DispatcherConfig,
    queue: Arc<WorkQueue>,
    ledger: Arc<JobLedger>,
    workers: Vec<watch::Receiver<WorkerStats>>,
    events: EventBus,
    /// Held from id assignment through enqueue so queue order matches id order.
    submissions: Mutex<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the pool: workers `1..=worker_count`, plus the queue monitor
    /// under [`SignalPolicy::Periodic`].
    ///
    /// Must be called from within a tokio runtime. The spawned tasks run until
    /// the dispatcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] if the configuration is rejected
    /// by [`DispatcherConfig::validate`].
    pub fn start(config: DispatcherConfig) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(WorkQueue::new(config.signal_policy));
        let ledger = Arc::new(JobLedger::new());
        let events = EventBus::new(config.event_capacity);
        let executor = JobExecutor::new(config.work.clone());

        let mut workers = Vec::with_capacity(config.worker_count);
        let mut tasks = Vec::with_capacity(config.worker_count + 1);

        for worker_id in 1..=config.worker_count as u64 {
            let (worker, stats_rx) =
                Worker::new(worker_id, queue.clone(), executor.clone(), events.clone());
            workers.push(stats_rx);
            tasks.push(tokio::spawn(worker.run()));
        }

        if config.signal_policy == SignalPolicy::Periodic {
            let monitor = QueueMonitor::new(config.queue_check_interval_ms);
            let monitor_queue = queue.clone();
            tasks.push(tokio::spawn(async move {
                monitor.run(monitor_queue).await;
            }));
        }

        tracing::info!(
            workers = config.worker_count,
            policy = ?config.signal_policy,
            queue_check_interval_ms = config.queue_check_interval_ms,
            "Dispatcher started"
        );

        Ok(Self {
            config,
            queue,
            ledger,
            workers,
            events,
            submissions: Mutex::new(()),
            tasks,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Create a job for `input` and queue it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::EmptyInput`] for empty or whitespace-only
    /// input. Nothing is created or queued in that case.
    pub async fn submit_job(&self, input: &str) -> Result<JobView> {
        if input.trim().is_empty() {
            tracing::warn!("Rejected job with empty input parameter");
            return Err(DispatchError::EmptyInput);
        }

        let _submission = self.submissions.lock().await;
        let job = self.ledger.create(input.to_string()).await;
        let view = job.read().await.view();
        self.events
            .publish(DispatchEvent::JobCreated { job: view.clone() });

        let depth = self.queue.enqueue(job).await;
        tracing::info!(job_id = view.id, queued_jobs = depth, "Job added to work queue");

        Ok(view)
    }

    /// All jobs ever submitted, in submission order.
    pub async fn ledger_snapshot(&self) -> Vec<JobView> {
        self.ledger.views().await
    }

    pub async fn job(&self, job_id: u64) -> Result<JobView> {
        let job = self
            .ledger
            .get(job_id)
            .await
            .ok_or(DispatchError::JobNotFound(job_id))?;
        let view = job.read().await.view();
        Ok(view)
    }

    /// Counters and claim history of one worker.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::WorkerNotFound`] for ids outside `1..=worker_count`.
    pub async fn worker_stats(&self, worker_id: u64) -> Result<WorkerStatsView> {
        let stats = usize::try_from(worker_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.workers.get(index))
            .map(|rx| rx.borrow().clone())
            .ok_or(DispatchError::WorkerNotFound(worker_id))?;

        let history = self.ledger.views_of(&stats.history).await;
        Ok(stats.view(history))
    }

    pub async fn all_worker_stats(&self) -> Vec<WorkerStatsView> {
        let mut views = Vec::with_capacity(self.workers.len());
        for rx in &self.workers {
            let stats = rx.borrow().clone();
            let history = self.ledger.views_of(&stats.history).await;
            views.push(stats.view(history));
        }
        views
    }

    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            jobs: self.ledger_snapshot().await,
            workers: self.all_worker_stats().await,
        }
    }

    pub async fn summary(&self) -> Summary {
        let (running_jobs, completed_jobs) =
            self.workers
                .iter()
                .fold((0usize, 0u64), |(running, completed), rx| {
                    let stats = rx.borrow();
                    let running = running + usize::from(stats.status == WorkerStatus::Running);
                    (running, completed + stats.completed_count)
                });

        Summary {
            total_jobs: self.ledger.len().await,
            pending_jobs: self.queue.depth().await,
            running_jobs,
            completed_jobs,
        }
    }

    pub async fn queue_depth(&self) -> usize {
        self.queue.depth().await
    }

    /// Receive job and worker events as they happen.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.events.subscribe()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
