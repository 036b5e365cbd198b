//! Bounded-concurrency runner

use super::BatchOrchestrator;
use crate::error::Error;
use crate::types::{BatchResult, ItemFailure, SharedItems, WorkItem};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

impl BatchOrchestrator {
    /// Process every item with at most `limit` items in flight, returning the failures
    ///
    /// One task is spawned per item; each waits for a slot on a semaphore of capacity
    /// `limit`, runs the retry loop, and releases the slot when it finishes, whether it
    /// succeeded, failed or panicked. The call returns once every task has finished.
    ///
    /// Failures are collected in completion order, which is not input order. A `limit` of
    /// zero is treated as one. An empty batch returns immediately without spawning.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use playlist_dl::{BatchOrchestrator, WorkItem};
    /// # async fn example(orchestrator: BatchOrchestrator, items: Vec<WorkItem>) {
    /// let result = orchestrator.run_batch(items, 5).await;
    /// for failure in &result.failures {
    ///     println!("{failure}");
    /// }
    /// # }
    /// ```
    pub async fn run_batch(&self, items: Vec<WorkItem>, limit: usize) -> BatchResult {
        if items.is_empty() {
            tracing::debug!("Empty batch, nothing to run");
            return BatchResult::default();
        }

        let limit = if limit == 0 {
            tracing::warn!("Concurrency limit 0 requested, using 1");
            1
        } else {
            limit
        };

        let total = items.len();
        let started = self.start_batch("concurrent", total, limit);

        let items: SharedItems = items.into();
        let slots = Arc::new(Semaphore::new(limit));
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<ItemFailure>();

        let handles: Vec<_> = (0..total)
            .map(|index| {
                let items = Arc::clone(&items);
                let slots = Arc::clone(&slots);
                let failure_tx = failure_tx.clone();
                let orchestrator = self.clone();

                tokio::spawn(async move {
                    let item = &items[index];

                    // Held until this task returns
                    let _permit = match slots.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            let failure = orchestrator
                                .report_failure(item.clone(), Error::TaskFailed(e.to_string()));
                            failure_tx.send(failure).ok();
                            return;
                        }
                    };

                    match orchestrator.retrying.attempt(item).await {
                        Ok(path) => orchestrator.report_success(item, &path),
                        Err(cause) => {
                            let failure = orchestrator.report_failure(item.clone(), cause);
                            failure_tx.send(failure).ok();
                        }
                    }
                })
            })
            .collect();
        drop(failure_tx);

        let joined = futures::future::join_all(handles).await;

        let mut failures = Vec::new();
        while let Some(failure) = failure_rx.recv().await {
            failures.push(failure);
        }

        // A task that could not be joined never reported its outcome
        for (index, result) in joined.into_iter().enumerate() {
            if let Err(e) = result {
                failures.push(
                    self.report_failure(items[index].clone(), Error::TaskFailed(e.to_string())),
                );
            }
        }

        self.finish_batch(total, started, failures)
    }
}
