//! Batch orchestration
//!
//! [`BatchOrchestrator`] runs a [`RetryingProcessor`] over every item of a batch and
//! aggregates the items that ultimately failed. Two runners share the same retry logic:
//!
//! - [`BatchOrchestrator::run_batch`]: up to `limit` items in flight at once, failures in
//!   completion order
//! - [`BatchOrchestrator::run_sequential`]: one item at a time, failures in input order
//!
//! A failing item never aborts or cancels its siblings; both runners return only after
//! every item has reached a terminal state.

mod concurrent;
mod sequential;


use crate::config::RetryConfig;
use crate::error::Error;
use crate::processor::ItemProcessor;
use crate::retry::RetryingProcessor;
use crate::types::{BatchResult, Event, EventSender, ItemFailure, WorkItem};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Capacity of the event channel created by [`BatchOrchestrator::new`]
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Runs batches of work items through a retrying processor
///
/// The orchestrator holds no per-batch state: each call to a runner owns its semaphore
/// and failure collector for exactly the duration of that call.
#[derive(Clone)]
pub struct BatchOrchestrator {
    retrying: Arc<RetryingProcessor>,
    event_tx: EventSender,
}

impl BatchOrchestrator {
    /// Create an orchestrator with its own event channel
    pub fn new(processor: Arc<dyn ItemProcessor>, retry: RetryConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_events(processor, retry, event_tx)
    }

    /// Create an orchestrator that publishes on an existing event channel
    pub fn with_events(
        processor: Arc<dyn ItemProcessor>,
        retry: RetryConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        let retrying = RetryingProcessor::new(processor, retry).with_events(event_tx.clone());
        Self {
            retrying: Arc::new(retrying),
            event_tx,
        }
    }

    /// Subscribe to batch and item events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The retrying processor shared by both runners
    pub fn retrying_processor(&self) -> &RetryingProcessor {
        &self.retrying
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    fn start_batch(&self, runner: &'static str, total: usize, limit: usize) -> Instant {
        tracing::info!(runner, total, limit, "Starting batch");
        self.emit(Event::BatchStarted { total, limit });
        Instant::now()
    }

    fn finish_batch(
        &self,
        total: usize,
        started: Instant,
        failures: Vec<ItemFailure>,
    ) -> BatchResult {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let failed = failures.len();
        if failed == 0 {
            tracing::info!(total, elapsed_ms, "All downloads completed successfully");
        } else {
            tracing::warn!(total, failed, elapsed_ms, "Batch finished with failures");
        }
        self.emit(Event::BatchFinished {
            total,
            failed,
            elapsed_ms,
        });
        BatchResult::from(failures)
    }

    fn report_success(&self, item: &WorkItem, path: &Path) {
        tracing::info!(
            fetch_id = item.fetch_id(),
            path = %path.display(),
            "Downloaded: {}",
            item.name()
        );
        self.emit(Event::ItemCompleted {
            fetch_id: item.fetch_id().to_string(),
            name: item.name().to_string(),
            path: path.to_path_buf(),
        });
    }

    fn report_failure(&self, item: WorkItem, cause: Error) -> ItemFailure {
        let attempts = match &cause {
            Error::RetryExhausted { attempts, .. } => *attempts,
            _ => 0,
        };
        tracing::error!(
            fetch_id = item.fetch_id(),
            attempts,
            error = %cause,
            "Failed to download {}",
            item
        );
        self.emit(Event::ItemFailed {
            fetch_id: item.fetch_id().to_string(),
            name: item.name().to_string(),
            attempts,
            error: cause.to_string(),
        });
        ItemFailure { item, cause }
    }
}
