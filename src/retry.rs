//! Per-item retry
//!
//! [`with_retry`] runs an async operation up to `max_attempts` times, sleeping between
//! attempts according to the configured [`Backoff`]. [`RetryingProcessor`] applies it to an
//! [`ItemProcessor`], turning "fails sometimes" into "fails only after N tries".
//!
//! # Example
//!
//! ```no_run
//! use playlist_dl::config::RetryConfig;
//! use playlist_dl::retry::with_retry;
//!
//! # async fn example() -> playlist_dl::Result<()> {
//! let config = RetryConfig::default();
//! let value = with_retry(&config, |_attempt| async {
//!     Ok::<_, playlist_dl::Error>(42)
//! }, |_failure| {})
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{Backoff, RetryConfig};
use crate::error::{Error, Result};
use crate::processor::ItemProcessor;
use crate::types::{Event, EventSender, WorkItem};
use futures::FutureExt;
use rand::Rng;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A failed attempt that will be followed by another one
#[derive(Debug)]
pub struct RetryNotice<'a> {
    /// 1-based number of the attempt that failed
    pub attempt: u32,
    /// Attempt budget
    pub max_attempts: u32,
    /// Why it failed
    pub error: &'a Error,
    /// How long until the next attempt
    pub delay: Duration,
}

/// Execute an async operation, retrying every failure until `max_attempts` is reached
///
/// The operation receives the 1-based attempt number. `on_retry` is called after each
/// failed attempt that will be retried, before the delay. After the final failed attempt
/// the last error is wrapped in [`Error::RetryExhausted`]; there is no delay after it.
/// A `max_attempts` of zero is treated as one.
pub async fn with_retry<F, Fut, T, R>(
    config: &RetryConfig,
    mut operation: F,
    mut on_retry: R,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut(RetryNotice<'_>),
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.delay;
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts => {
                let wait = if config.jitter { add_jitter(delay) } else { delay };

                tracing::debug!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = wait.as_millis() as u64,
                    "Attempt failed, retrying"
                );
                on_retry(RetryNotice {
                    attempt,
                    max_attempts,
                    error: &e,
                    delay: wait,
                });

                tokio::time::sleep(wait).await;
                delay = next_delay(&config.backoff, delay);
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    attempts = attempt,
                    "Operation failed after all attempts exhausted"
                );
                return Err(Error::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
        }
    }
}

/// Delay to use after `current` under the given backoff policy
fn next_delay(backoff: &Backoff, current: Duration) -> Duration {
    match backoff {
        Backoff::Fixed => current,
        Backoff::Exponential {
            multiplier,
            max_delay,
        } => {
            // Overflow or NaN saturates at the cap instead of panicking
            Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
                .map_or(*max_delay, |next| next.min(*max_delay))
        }
    }
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
        .unwrap_or(Duration::MAX)
}

/// Wraps an [`ItemProcessor`] with the configured retry policy
///
/// A panic inside the processor is caught and counts as a failed attempt.
pub struct RetryingProcessor {
    processor: Arc<dyn ItemProcessor>,
    config: RetryConfig,
    event_tx: Option<EventSender>,
}

impl RetryingProcessor {
    /// Create a retrying wrapper around `processor`
    pub fn new(processor: Arc<dyn ItemProcessor>, config: RetryConfig) -> Self {
        Self {
            processor,
            config,
            event_tx: None,
        }
    }

    /// Also publish per-attempt events on `event_tx`
    pub(crate) fn with_events(mut self, event_tx: EventSender) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// The retry policy in effect
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Effective attempt budget (never zero)
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Process `item`, retrying failures
    ///
    /// Returns the processor's output on the first success, or
    /// [`Error::RetryExhausted`] carrying the last cause once every attempt failed.
    pub async fn attempt(&self, item: &WorkItem) -> Result<PathBuf> {
        with_retry(
            &self.config,
            |attempt| {
                self.emit(Event::ItemStarted {
                    fetch_id: item.fetch_id().to_string(),
                    attempt,
                });
                AssertUnwindSafe(self.processor.process(item))
                    .catch_unwind()
                    .map(|outcome| {
                        outcome.unwrap_or_else(|panic| Err(Error::Panicked(panic_message(&panic))))
                    })
            },
            |notice| {
                tracing::warn!(
                    fetch_id = item.fetch_id(),
                    name = item.name(),
                    attempt = notice.attempt,
                    "Attempt {} failed for {}: {}. Retrying...",
                    notice.attempt,
                    item,
                    notice.error
                );
                self.emit(Event::AttemptFailed {
                    fetch_id: item.fetch_id().to_string(),
                    name: item.name().to_string(),
                    attempt: notice.attempt,
                    max_attempts: notice.max_attempts,
                    error: notice.error.to_string(),
                    retry_in_ms: notice.delay.as_millis() as u64,
                });
            },
        )
        .await
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            // No subscribers is fine
            tx.send(event).ok();
        }
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
