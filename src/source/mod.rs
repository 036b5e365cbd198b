//! Remote media metadata
//!
//! The [`MediaSource`] trait covers the two remote calls the downloader needs: listing a
//! playlist's videos and resolving the downloadable formats of a single video.
//!
//! - [`YtDlpSource`]: uses the external `yt-dlp` binary
//!
//! Format choice lives here too: [`select_best_audio_format`] picks the audio-bearing format
//! with the highest bitrate, and that exact format is the one that gets streamed.

mod parser;
mod ytdlp;

pub use parser::{parse_playlist_json, parse_video_json};
pub use ytdlp::YtDlpSource;

use async_trait::async_trait;
use std::collections::HashMap;

/// One entry of a playlist listing
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    /// Video ID
    pub id: String,
    /// Video title
    pub title: String,
    /// Channel or uploader name
    pub uploader: String,
}

/// A playlist as returned by the remote service
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistListing {
    /// Playlist ID
    pub id: String,
    /// Playlist title
    pub title: String,
    /// Videos in playlist order
    pub entries: Vec<PlaylistEntry>,
}

/// A downloadable rendition of a video
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamFormat {
    /// Service-specific format identifier
    pub format_id: String,
    /// Direct stream URL
    pub url: String,
    /// Container extension (e.g. "webm", "m4a")
    pub ext: String,
    /// Audio codec, `None` or "none" when the format carries no audio
    pub acodec: Option<String>,
    /// Video codec, `None` or "none" when the format is audio-only
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbit/s
    pub abr: Option<f64>,
    /// Average total bitrate in kbit/s
    pub tbr: Option<f64>,
    /// Headers the service expects on the stream request
    pub http_headers: HashMap<String, String>,
}

impl StreamFormat {
    /// Whether this format carries an audio track
    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|c| c != "none") || self.abr.is_some_and(|b| b > 0.0)
    }

    /// Whether this format carries a video track
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|c| c != "none")
    }

    /// Bitrate used for ranking: audio bitrate, else total bitrate, else 0
    pub fn audio_bitrate(&self) -> f64 {
        self.abr.or(self.tbr).unwrap_or(0.0)
    }
}

/// Metadata of a single video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Video ID
    pub id: String,
    /// Video title
    pub title: String,
    /// Channel or uploader name
    pub uploader: Option<String>,
    /// Available formats
    pub formats: Vec<StreamFormat>,
}

/// Pick the highest-bitrate format that carries audio and has a stream URL
///
/// On equal bitrate an audio-only format wins over one that also carries video, since it
/// is smaller to transfer. Returns `None` when no format carries audio.
pub fn select_best_audio_format(formats: &[StreamFormat]) -> Option<&StreamFormat> {
    formats
        .iter()
        .filter(|f| f.has_audio() && !f.url.is_empty())
        .max_by(|a, b| {
            a.audio_bitrate()
                .total_cmp(&b.audio_bitrate())
                .then_with(|| b.has_video().cmp(&a.has_video()))
        })
}

/// Remote playlist and video metadata service
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// List the videos of a playlist
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ExtractionError`] on network or parsing failure.
    async fn list_playlist(&self, playlist_id: &str) -> crate::Result<PlaylistListing>;

    /// Resolve metadata and formats for one video
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::FetchError`] when the video cannot be resolved.
    async fn video_info(&self, fetch_id: &str) -> crate::Result<VideoInfo>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
