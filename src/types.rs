//! Core types and events

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One unit of batch work: the audio-extraction target derived from one playlist video
///
/// Immutable once constructed. Fields are private so a `WorkItem` can be shared by
/// reference across tasks without anyone changing it underneath them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    name: String,
    attribution: String,
    fetch_id: String,
}

impl WorkItem {
    /// Create a work item
    pub fn new(
        name: impl Into<String>,
        attribution: impl Into<String>,
        fetch_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attribution: attribution.into(),
            fetch_id: fetch_id.into(),
        }
    }

    /// Display name (video title)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribution string (uploader / artist)
    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    /// Opaque identifier handed to the fetcher
    pub fn fetch_id(&self) -> &str {
        &self.fetch_id
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.name, self.attribution)
    }
}

/// An item that ended in the failed-exhausted state, with the error that put it there
#[derive(Debug)]
pub struct ItemFailure {
    /// The item that failed
    pub item: WorkItem,
    /// Causal error (normally [`Error::RetryExhausted`])
    pub cause: Error,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to download {} by {}: {}",
            self.item.name(),
            self.item.attribution(),
            self.cause
        )
    }
}

impl std::error::Error for ItemFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Outcome of one batch
///
/// An empty failure list means every item succeeded. The concurrent runner records
/// failures in completion order; the sequential runner in input order.
#[derive(Debug, Default)]
#[must_use]
pub struct BatchResult {
    /// Items that exhausted their attempts
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fetch IDs of the failed items, in recorded order
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.item.fetch_id()).collect()
    }
}

impl From<Vec<ItemFailure>> for BatchResult {
    fn from(failures: Vec<ItemFailure>) -> Self {
        Self { failures }
    }
}

/// Per-item lifecycle shared by both runners
///
/// `Pending → Attempting → {Succeeded | RetryWait → Attempting} → FailedExhausted`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Not started (waiting for a concurrency slot)
    Pending,
    /// An attempt is in flight
    Attempting,
    /// Waiting out the delay before the next attempt
    RetryWait,
    /// Terminal: an attempt succeeded
    Succeeded,
    /// Terminal: every attempt failed
    FailedExhausted,
}

impl ItemState {
    /// Whether the item can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Succeeded | ItemState::FailedExhausted)
    }
}

/// Event emitted during a batch
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch was accepted
    BatchStarted {
        /// Number of items in the batch
        total: usize,
        /// Effective concurrency limit
        limit: usize,
    },

    /// An attempt on an item is starting
    ItemStarted {
        /// Item identifier
        fetch_id: String,
        /// 1-based attempt number
        attempt: u32,
    },

    /// An attempt failed and the item will be retried
    AttemptFailed {
        /// Item identifier
        fetch_id: String,
        /// Item display name
        name: String,
        /// 1-based attempt number that failed
        attempt: u32,
        /// Configured attempt budget
        max_attempts: u32,
        /// Error message
        error: String,
        /// Delay before the next attempt
        retry_in_ms: u64,
    },

    /// An item finished successfully
    ItemCompleted {
        /// Item identifier
        fetch_id: String,
        /// Item display name
        name: String,
        /// File written by the processor
        path: PathBuf,
    },

    /// An item exhausted its attempts
    ItemFailed {
        /// Item identifier
        fetch_id: String,
        /// Item display name
        name: String,
        /// Attempts made
        attempts: u32,
        /// Error message
        error: String,
    },

    /// Every item of a batch reached a terminal state
    BatchFinished {
        /// Number of items in the batch
        total: usize,
        /// Number of failed items
        failed: usize,
        /// Wall-clock duration of the batch
        elapsed_ms: u64,
    },
}

impl Event {
    /// Fetch ID of the item this event concerns, if any
    pub fn fetch_id(&self) -> Option<&str> {
        match self {
            Event::ItemStarted { fetch_id, .. }
            | Event::AttemptFailed { fetch_id, .. }
            | Event::ItemCompleted { fetch_id, .. }
            | Event::ItemFailed { fetch_id, .. } => Some(fetch_id.as_str()),
            Event::BatchStarted { .. } | Event::BatchFinished { .. } => None,
        }
    }

    /// State the item enters with this event, if it is an item event
    pub fn item_state(&self) -> Option<ItemState> {
        match self {
            Event::ItemStarted { .. } => Some(ItemState::Attempting),
            Event::AttemptFailed { .. } => Some(ItemState::RetryWait),
            Event::ItemCompleted { .. } => Some(ItemState::Succeeded),
            Event::ItemFailed { .. } => Some(ItemState::FailedExhausted),
            Event::BatchStarted { .. } | Event::BatchFinished { .. } => None,
        }
    }
}

/// Broadcast sender shared by the retry loop and the runners
pub(crate) type EventSender = tokio::sync::broadcast::Sender<Event>;

/// Shared item list handed to spawned tasks
pub(crate) type SharedItems = Arc<[WorkItem]>;
