//! Audio transcoding
//!
//! The [`Transcoder`] trait turns a downloaded stream file into the configured output format.
//!
//! - [`FfmpegTranscoder`]: uses the external `ffmpeg` binary

mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

use crate::config::AudioConfig;
use async_trait::async_trait;
use std::path::Path;

/// Converts a media file into a compressed audio file
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcode `input` into `output` using the given encoding settings
    ///
    /// An existing `output` is overwritten. The collision policy is applied by the caller
    /// before this is invoked.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EncodeError`] when the transcoder fails or writes nothing.
    async fn transcode(&self, input: &Path, output: &Path, audio: &AudioConfig)
    -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
