use std::sync::Arc;

use tokio::sync::RwLock;

use crate::scheduler::job::{Job, JobView, SharedJob};

/// Every job ever submitted, in submission order.
///
/// Entries are never removed, so a job's id is its position plus one. The id
/// is derived while holding the write lock, which keeps concurrent submissions
/// from colliding.
#[derive(Debug, Default)]
pub struct JobLedger {
    jobs: RwLock<Vec<SharedJob>>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job with the next id and append it.
    pub async fn create(&self, input_param: String) -> SharedJob {
        let mut jobs = self.jobs.write().await;
        let id = jobs.len() as u64 + 1;
        let job = Arc::new(RwLock::new(Job::new(id, input_param)));
        jobs.push(job.clone());
        job
    }

    pub async fn get(&self, id: u64) -> Option<SharedJob> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.jobs.read().await.get(index).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Views of all jobs in submission order.
    ///
    /// The handles are cloned out first so the ledger lock is not held while
    /// waiting on individual jobs.
    pub async fn views(&self) -> Vec<JobView> {
        let handles: Vec<SharedJob> = self.jobs.read().await.clone();
        let mut views = Vec::with_capacity(handles.len());
        for job in handles {
            views.push(job.read().await.view());
        }
        views
    }

    /// Views of the given jobs, skipping unknown ids.
    pub async fn views_of(&self, ids: &[u64]) -> Vec<JobView> {
        let mut views = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(job) = self.get(id).await {
                views.push(job.read().await.view());
            }
        }
        views
    }
}
