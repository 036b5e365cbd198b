//! Single-item processing
//!
//! An [`ItemProcessor`] performs the whole fetch, transcode and write sequence for one
//! [`WorkItem`] and reports success or a typed failure. It has no retry logic of its own;
//! that is layered on by [`crate::retry::RetryingProcessor`].
//!
//! - [`AudioExtractor`]: resolves the best audio stream, downloads it and transcodes it

mod audio;

pub use audio::AudioExtractor;

use crate::types::WorkItem;
use async_trait::async_trait;
use std::path::PathBuf;

/// Processes one work item end to end
///
/// Implementations must be safe to call concurrently for different items.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Process `item`, returning the path of the file written
    ///
    /// # Errors
    ///
    /// Returns a fetch, stream, encode or I/O error describing why this one item failed.
    async fn process(&self, item: &WorkItem) -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
