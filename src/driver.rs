//! Playlist-level driver
//!
//! [`PlaylistDownloader`] ties the pieces together: it resolves a playlist URL, builds the
//! work items, runs them through a [`BatchOrchestrator`] backed by an [`AudioExtractor`],
//! and reports the outcome. Failing to list the playlist is the one error that aborts a
//! run before any item starts; per-item failures are returned in the report instead.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::orchestrator::BatchOrchestrator;
use crate::playlist::{self, Playlist};
use crate::processor::AudioExtractor;
use crate::source::{MediaSource, YtDlpSource};
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::types::{BatchResult, Event};
use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Capacity of the downloader's event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Outcome of [`PlaylistDownloader::process_playlist`]
#[derive(Debug)]
#[must_use]
pub struct PlaylistReport {
    /// The playlist that was processed
    pub playlist: Playlist,
    /// Directory the audio files were written to
    pub output_dir: PathBuf,
    /// Items that failed
    pub result: BatchResult,
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// How long the batch took
    pub elapsed: Duration,
}

impl PlaylistReport {
    /// True when every item was downloaded
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Timings of the same playlist downloaded by both runners
#[derive(Debug)]
#[must_use]
pub struct SpeedComparison {
    /// Wall-clock time of the concurrent runner
    pub concurrent: Duration,
    /// Wall-clock time of the sequential runner
    pub sequential: Duration,
    /// Failures of the concurrent run
    pub concurrent_result: BatchResult,
    /// Failures of the sequential run
    pub sequential_result: BatchResult,
}

impl SpeedComparison {
    /// Time saved by the concurrent runner, as a percentage of the sequential time
    ///
    /// Negative when the concurrent run was slower; zero when the sequential run took no
    /// measurable time.
    pub fn improvement_percent(&self) -> f64 {
        let sequential = self.sequential.as_secs_f64();
        if sequential == 0.0 {
            return 0.0;
        }
        (sequential - self.concurrent.as_secs_f64()) / sequential * 100.0
    }
}

/// Downloads whole playlists as audio files
///
/// # Example
///
/// ```no_run
/// use playlist_dl::{Config, PlaylistDownloader};
///
/// # #[tokio::main]
/// # async fn main() -> playlist_dl::Result<()> {
/// let downloader = PlaylistDownloader::new(Config::default())?;
/// let report = downloader
///     .process_playlist("https://www.youtube.com/playlist?list=PLxyz", None)
///     .await?;
/// for failure in &report.result.failures {
///     eprintln!("{failure}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct PlaylistDownloader {
    config: Arc<Config>,
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    event_tx: broadcast::Sender<Event>,
}

impl PlaylistDownloader {
    /// Create a downloader using yt-dlp and ffmpeg
    ///
    /// Explicit tool paths from [`ToolsConfig`](crate::config::ToolsConfig) are used as
    /// given; otherwise the binaries are looked up on PATH when `search_path` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration and [`Error::NotSupported`]
    /// when a required binary cannot be found.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = match &config.tools.ytdlp_path {
            Some(path) => YtDlpSource::new(path.clone()),
            None if config.tools.search_path => YtDlpSource::from_path().ok_or_else(|| {
                Error::NotSupported("yt-dlp binary not found in PATH".to_string())
            })?,
            None => {
                return Err(Error::NotSupported(
                    "yt-dlp path not configured and PATH search disabled".to_string(),
                ));
            }
        };

        let transcoder = match &config.tools.ffmpeg_path {
            Some(path) => FfmpegTranscoder::new(path.clone()),
            None if config.tools.search_path => FfmpegTranscoder::from_path().ok_or_else(|| {
                Error::NotSupported("ffmpeg binary not found in PATH".to_string())
            })?,
            None => {
                return Err(Error::NotSupported(
                    "ffmpeg path not configured and PATH search disabled".to_string(),
                ));
            }
        };

        tracing::debug!(
            ytdlp = %source.binary_path().display(),
            ffmpeg = %transcoder.binary_path().display(),
            "External tools resolved"
        );

        Ok(Self::with_components(
            config,
            Arc::new(source),
            Arc::new(transcoder),
        ))
    }

    /// Create a downloader from explicit source and transcoder implementations
    pub fn with_components(
        config: Config,
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            source,
            transcoder,
            event_tx,
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to batch and item events from every run of this downloader
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve a playlist URL into work items without downloading anything
    pub async fn fetch_playlist(&self, url: &str) -> Result<Playlist> {
        playlist::fetch_playlist(self.source.as_ref(), url).await
    }

    /// Directory a playlist is written to: `output_dir/<folder_name>`
    ///
    /// A missing or blank folder name falls back to the configured prefix plus the ID.
    pub fn output_dir_for(&self, playlist: &Playlist, folder_name: Option<&str>) -> PathBuf {
        let folder = match folder_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => playlist.default_folder_name(&self.config.download.playlist_folder_prefix),
        };
        self.config.download.output_dir.join(folder)
    }

    fn orchestrator_for(&self, output_dir: &Path) -> Result<BatchOrchestrator> {
        let extractor = AudioExtractor::new(
            Arc::clone(&self.source),
            Arc::clone(&self.transcoder),
            &self.config,
            output_dir,
        )?;
        Ok(BatchOrchestrator::with_events(
            Arc::new(extractor),
            self.config.retry.clone(),
            self.event_tx.clone(),
        ))
    }

    /// Download every item of `playlist` into `output_dir` with the concurrent runner
    pub async fn download(&self, playlist: &Playlist, output_dir: &Path) -> Result<BatchResult> {
        let orchestrator = self.orchestrator_for(output_dir)?;
        Ok(orchestrator
            .run_batch(playlist.items.clone(), self.config.download.max_concurrent)
            .await)
    }

    /// Resolve, download and report a whole playlist
    ///
    /// # Errors
    ///
    /// Only failures that prevent the batch from starting are returned as errors; item
    /// failures are listed in [`PlaylistReport::result`].
    pub async fn process_playlist(
        &self,
        url: &str,
        folder_name: Option<&str>,
    ) -> Result<PlaylistReport> {
        let playlist = self.fetch_playlist(url).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "Failed to extract playlist info");
        })?;

        let output_dir = self.output_dir_for(&playlist, folder_name);
        tracing::info!(
            playlist_id = %playlist.id,
            output_dir = %output_dir.display(),
            items = playlist.items.len(),
            "Downloading playlist"
        );

        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.download(&playlist, &output_dir).await?;

        Ok(PlaylistReport {
            playlist,
            output_dir,
            result,
            started_at,
            elapsed: started.elapsed(),
        })
    }

    /// Download `playlist` once with each runner and time both
    ///
    /// The concurrent run writes to `<base_dir>_concurrent`, the sequential run to
    /// `<base_dir>_sequential`.
    pub async fn compare_runners(
        &self,
        playlist: &Playlist,
        base_dir: &Path,
    ) -> Result<SpeedComparison> {
        let concurrent_dir = with_suffix(base_dir, "_concurrent");
        let sequential_dir = with_suffix(base_dir, "_sequential");

        let started = Instant::now();
        let concurrent_result = self.download(playlist, &concurrent_dir).await?;
        let concurrent = started.elapsed();

        let orchestrator = self.orchestrator_for(&sequential_dir)?;
        let started = Instant::now();
        let sequential_result = orchestrator.run_sequential(playlist.items.clone()).await;
        let sequential = started.elapsed();

        let comparison = SpeedComparison {
            concurrent,
            sequential,
            concurrent_result,
            sequential_result,
        };
        tracing::info!(
            concurrent_ms = concurrent.as_millis() as u64,
            sequential_ms = sequential.as_millis() as u64,
            improvement_percent = comparison.improvement_percent(),
            "Speed comparison finished"
        );
        Ok(comparison)
    }
}

/// `path` with `suffix` appended to its last component
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}
