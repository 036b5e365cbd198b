//! yt-dlp backed media source

use super::parser::{parse_playlist_json, parse_video_json};
use super::{MediaSource, PlaylistListing, VideoInfo};
use crate::error::{ExtractionError, FetchError};
use crate::playlist::{playlist_url, watch_url};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Media source that shells out to the external `yt-dlp` binary
///
/// Playlists are listed with `--flat-playlist` so only one request is made per listing;
/// per-video formats are resolved lazily when an item is processed.
///
/// # Examples
///
/// ```no_run
/// use playlist_dl::source::{MediaSource, YtDlpSource};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = YtDlpSource::from_path().expect("yt-dlp not found in PATH");
/// let listing = source.list_playlist("PLabc123").await?;
/// println!("{} videos", listing.entries.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary_path: PathBuf,
}

impl YtDlpSource {
    /// Create a source with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Path of the binary this source runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn run(&self, args: &[String]) -> crate::Result<Output> {
        tracing::debug!(binary = %self.binary_path.display(), ?args, "Running yt-dlp");
        Command::new(&self.binary_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))
    }
}

fn listing_args(playlist_id: &str) -> Vec<String> {
    vec![
        "--flat-playlist".into(),
        "--dump-single-json".into(),
        "--no-warnings".into(),
        playlist_url(playlist_id),
    ]
}

fn video_args(fetch_id: &str) -> Vec<String> {
    vec![
        "--dump-single-json".into(),
        "--no-warnings".into(),
        "--no-playlist".into(),
        "--skip-download".into(),
        watch_url(fetch_id),
    ]
}

/// Last non-empty stderr line, which is where yt-dlp puts its `ERROR:` message
fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status))
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn list_playlist(&self, playlist_id: &str) -> crate::Result<PlaylistListing> {
        let output = self.run(&listing_args(playlist_id)).await?;
        if !output.status.success() {
            return Err(ExtractionError::ListingFailed {
                playlist_id: playlist_id.to_string(),
                reason: failure_reason(&output),
            }
            .into());
        }
        parse_playlist_json(playlist_id, &output.stdout)
    }

    async fn video_info(&self, fetch_id: &str) -> crate::Result<VideoInfo> {
        let output = self.run(&video_args(fetch_id)).await?;
        if !output.status.success() {
            return Err(FetchError::MetadataFailed {
                fetch_id: fetch_id.to_string(),
                reason: failure_reason(&output),
            }
            .into());
        }
        parse_video_json(fetch_id, &output.stdout)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
