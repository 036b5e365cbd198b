//! One-at-a-time runner, used for timing comparisons

use super::BatchOrchestrator;
use crate::types::{BatchResult, WorkItem};

impl BatchOrchestrator {
    /// Process items strictly one after another, returning the failures in input order
    ///
    /// Same retry policy and outcome as [`run_batch`](Self::run_batch) with a limit of one,
    /// without spawning any tasks.
    pub async fn run_sequential(&self, items: Vec<WorkItem>) -> BatchResult {
        if items.is_empty() {
            tracing::debug!("Empty batch, nothing to run");
            return BatchResult::default();
        }

        let total = items.len();
        let started = self.start_batch("sequential", total, 1);

        let mut failures = Vec::new();
        for item in items {
            match self.retrying.attempt(&item).await {
                Ok(path) => self.report_success(&item, &path),
                Err(cause) => failures.push(self.report_failure(item, cause)),
            }
        }

        self.finish_batch(total, started, failures)
    }
}
