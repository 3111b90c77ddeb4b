use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::config::WorkConfig;

/// Result of job execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub job_id: u64,
    pub result: u64,
    pub elapsed: Duration,
}

/// Runs the simulated workload of a job.
///
/// Each input character costs one random delay and adds `result_step` to the
/// result, so execution time varies with both input length and chance.
/// Execution cannot fail.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    config: WorkConfig,
}

impl JobExecutor {
    pub fn new(config: WorkConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self, job_id: u64, input: &str) -> ExecutionResult {
        tracing::debug!(job_id, input, "Executing job");

        let started = Instant::now();
        let mut result: u64 = 0;
        for _ in input.chars() {
            result = result.saturating_add(self.config.result_step);
            tokio::time::sleep(self.step_delay()).await;
        }

        ExecutionResult {
            job_id,
            result,
            elapsed: started.elapsed(),
        }
    }

    fn step_delay(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let ms = rng.gen_range(self.config.step_delay_min_ms..=self.config.step_delay_max_ms);
        Duration::from_millis(ms)
    }
}
