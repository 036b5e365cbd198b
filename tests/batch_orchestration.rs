//! Batch orchestration through the public API
//!
//! Exercises `BatchOrchestrator` with a custom `ItemProcessor`, the way a consumer that
//! does not use the audio pipeline would.

mod common;

use common::{FlakyProcessor, drain_events, work_items};
use playlist_dl::config::{Backoff, RetryConfig};
use playlist_dl::{BatchOrchestrator, Error, Event};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

fn retry(max_attempts: u32, delay_ms: u64) -> RetryConfig {
    RetryConfig {
        max_attempts,
        delay: Duration::from_millis(delay_ms),
        backoff: Backoff::Fixed,
        jitter: false,
    }
}

#[tokio::test]
async fn isolation_example_fails_exactly_a_and_c() {
    let processor = Arc::new(FlakyProcessor::failing(
        &["A", "C"],
        Duration::from_millis(5),
    ));
    let orchestrator = BatchOrchestrator::new(processor.clone(), retry(3, 5));

    let result = orchestrator
        .run_batch(work_items(&["A", "B", "C"]), 2)
        .await;

    let failed: HashSet<&str> = result.failed_ids().into_iter().collect();
    assert_eq!(failed, HashSet::from(["A", "C"]));
    assert_eq!(processor.calls_for("A"), 3);
    assert_eq!(processor.calls_for("B"), 1);
    assert_eq!(processor.calls_for("C"), 3);
    assert!(processor.high_water.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn succeeding_item_is_not_delayed_by_failing_sibling_retries() {
    let processor = Arc::new(FlakyProcessor::failing(&["slow-fail"], Duration::ZERO));
    let orchestrator = BatchOrchestrator::new(processor.clone(), retry(3, 200));
    let mut rx = orchestrator.subscribe();

    let started = Instant::now();
    let result = orchestrator
        .run_batch(work_items(&["slow-fail", "quick"]), 2)
        .await;
    let total = started.elapsed();

    assert_eq!(result.failed_ids(), vec!["slow-fail"]);
    // Two 200ms waits for the failing item; none after its last attempt
    assert!(total >= Duration::from_millis(400), "took {total:?}");

    let events = drain_events(&mut rx);
    let quick_done = events
        .iter()
        .position(|e| matches!(e, Event::ItemCompleted { fetch_id, .. } if fetch_id == "quick"))
        .expect("quick item should complete");
    let second_retry = events
        .iter()
        .position(|e| {
            matches!(
                e,
                Event::AttemptFailed { fetch_id, attempt: 2, .. } if fetch_id == "slow-fail"
            )
        })
        .expect("failing item should be retried twice");
    assert!(
        quick_done < second_retry,
        "the succeeding item finished before the failing one was done retrying"
    );
}

#[tokio::test]
async fn sequential_runner_preserves_input_order() {
    let processor = Arc::new(FlakyProcessor::failing(
        &["e", "b", "d"],
        Duration::from_millis(1),
    ));
    let orchestrator = BatchOrchestrator::new(processor.clone(), retry(2, 1));

    let result = orchestrator
        .run_sequential(work_items(&["a", "b", "c", "d", "e"]))
        .await;

    assert_eq!(result.failed_ids(), vec!["b", "d", "e"]);
    assert_eq!(processor.high_water.load(Ordering::SeqCst), 1);
    let calls = processor.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["a", "b", "b", "c", "d", "d", "e", "e"]);
}

#[tokio::test]
async fn every_failure_carries_retry_exhaustion() {
    let processor = Arc::new(FlakyProcessor::failing(&["x", "y"], Duration::ZERO));
    let orchestrator = BatchOrchestrator::new(processor, retry(4, 1));

    let result = orchestrator.run_batch(work_items(&["x", "y", "z"]), 3).await;

    assert_eq!(result.failures.len(), 2);
    for failure in &result.failures {
        match &failure.cause {
            Error::RetryExhausted { attempts, source } => {
                assert_eq!(*attempts, 4);
                assert_eq!(
                    source.to_string(),
                    format!("{} is unavailable", failure.item.fetch_id())
                );
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert_eq!(failure.cause.error_code(), "retry_exhausted");
    }
}

#[tokio::test]
async fn retrying_processor_reports_effective_budget() {
    let processor = Arc::new(FlakyProcessor::failing(&[], Duration::ZERO));
    let orchestrator = BatchOrchestrator::new(processor, retry(0, 1));

    assert_eq!(orchestrator.retrying_processor().max_attempts(), 1);
    assert_eq!(orchestrator.retrying_processor().config().max_attempts, 0);
}
