use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use crate::config::SignalPolicy;
use crate::scheduler::job::SharedJob;

/// FIFO of jobs waiting for a worker, plus the wake-up signal for idle workers.
///
/// Waking and taking are separate steps: [`WorkQueue::wait_for_availability`]
/// only says that work *may* be queued. The caller must follow up with
/// [`WorkQueue::try_dequeue`] and cope with getting nothing back, since another
/// worker can win the race or the signal can be stale.
#[derive(Debug)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<SharedJob>>,
    available: Notify,
    policy: SignalPolicy,
}

impl WorkQueue {
    pub fn new(policy: SignalPolicy) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            policy,
        }
    }

    pub fn policy(&self) -> SignalPolicy {
        self.policy
    }

    /// Append a job to the tail. Returns the queue depth after the push.
    pub async fn enqueue(&self, job: SharedJob) -> usize {
        let depth = {
            let mut pending = self.pending.lock().await;
            pending.push_back(job);
            pending.len()
        };
        if self.policy == SignalPolicy::OnEnqueue {
            self.available.notify_one();
        }
        depth
    }

    /// Remove and return the head of the queue, or `None` if it is empty.
    pub async fn try_dequeue(&self) -> Option<SharedJob> {
        let mut pending = self.pending.lock().await;
        let job = pending.pop_front()?;
        // Signals coalesce when nobody is waiting, so pass one along while
        // work remains. The periodic monitor covers this under `Periodic`.
        if self.policy == SignalPolicy::OnEnqueue && !pending.is_empty() {
            self.available.notify_one();
        }
        Some(job)
    }

    /// Suspend until a signal arrives. A signal sent while nobody was waiting
    /// is kept for the next caller, so this can return with the queue empty.
    pub async fn wait_for_availability(&self) {
        self.available.notified().await;
    }

    /// Wake at most one waiting worker if anything is queued. Returns whether
    /// a signal was sent.
    pub async fn signal_if_pending(&self) -> bool {
        let pending = self.pending.lock().await;
        if pending.is_empty() {
            return false;
        }
        self.available.notify_one();
        true
    }

    pub async fn depth(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
