//! # playlist-dl
//!
//! Concurrent playlist audio downloader library.
//!
//! Given a public playlist URL, playlist-dl lists the playlist's videos, downloads the best
//! audio stream of each, and transcodes it into a compressed audio file. Items run in
//! parallel under a fixed concurrency limit; each item is retried independently, and the
//! items that still fail are collected and reported without aborting the rest.
//!
//! ## Design
//!
//! - **Library-first** - no CLI or UI; the runnable drivers live in `demos/`
//! - **Fail-soft batches** - one bad item never cancels or starves its siblings
//! - **Event-driven** - consumers subscribe to [`Event`]s instead of polling
//! - **Pluggable seams** - [`ItemProcessor`], [`MediaSource`] and [`Transcoder`] are traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use playlist_dl::{Config, PlaylistDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = PlaylistDownloader::new(Config::default())?;
//!
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = downloader
//!         .process_playlist("https://www.youtube.com/playlist?list=PLxyz", None)
//!         .await?;
//!     if report.is_success() {
//!         println!("All downloads completed successfully!");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Running a batch directly
//!
//! The orchestrator works on any [`ItemProcessor`], not only the audio pipeline:
//!
//! ```no_run
//! use playlist_dl::{BatchOrchestrator, ItemProcessor, WorkItem};
//! use playlist_dl::config::RetryConfig;
//! use std::sync::Arc;
//!
//! # async fn example(processor: Arc<dyn ItemProcessor>) {
//! let orchestrator = BatchOrchestrator::new(processor, RetryConfig::default());
//! let items = vec![WorkItem::new("Song", "Artist", "dQw4w9WgXcQ")];
//! let result = orchestrator.run_batch(items, 5).await;
//! assert!(result.is_success());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Playlist-level driver and speed comparison
pub mod driver;
/// Error types
pub mod error;
/// Batch orchestration (concurrent and sequential runners)
pub mod orchestrator;
/// Playlist URL parsing and expansion into work items
pub mod playlist;
/// Single-item processing
pub mod processor;
/// Per-item retry with fixed or exponential delay
pub mod retry;
/// Remote playlist and video metadata
pub mod source;
/// Audio transcoding
pub mod transcode;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, FileCollisionAction, RetryConfig};
pub use driver::{PlaylistDownloader, PlaylistReport, SpeedComparison};
pub use error::{EncodeError, Error, ExtractionError, FetchError, Result, StreamError};
pub use orchestrator::BatchOrchestrator;
pub use playlist::{Playlist, extract_playlist_id};
pub use processor::{AudioExtractor, ItemProcessor};
pub use retry::RetryingProcessor;
pub use source::{MediaSource, YtDlpSource};
pub use transcode::{FfmpegTranscoder, Transcoder};
pub use types::{BatchResult, Event, ItemFailure, ItemState, WorkItem};
