//! Audio extraction: metadata, stream download, transcode

use super::ItemProcessor;
use crate::config::{AudioConfig, Config, FileCollisionAction};
use crate::error::{FetchError, Result, StreamError};
use crate::source::{MediaSource, StreamFormat, select_best_audio_format};
use crate::transcode::Transcoder;
use crate::types::WorkItem;
use crate::utils::{claim_output_path, sanitize_filename};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Connect timeout for stream requests
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// The production [`ItemProcessor`]
///
/// For each item: resolve the video's formats, pick the highest-bitrate audio format,
/// stream exactly that format into a temp file, then transcode it to
/// `<output_dir>/<sanitized title>.<ext>`. The temp file is removed on every exit path.
#[derive(Clone)]
pub struct AudioExtractor {
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    http: reqwest::Client,
    audio: AudioConfig,
    output_dir: PathBuf,
    temp_dir: PathBuf,
    collision: FileCollisionAction,
}

impl AudioExtractor {
    /// Create an extractor writing into `output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Network`] if the HTTP client cannot be built.
    pub fn new(
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
        config: &Config,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            source,
            transcoder,
            http,
            audio: config.audio.clone(),
            output_dir: output_dir.into(),
            temp_dir: config.download.temp_dir(),
            collision: config.download.file_collision,
        })
    }

    /// A copy of this extractor that writes into a different directory
    pub fn with_output_dir(&self, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..self.clone()
        }
    }

    /// Directory finished files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stream `format` into `dest`, returning the number of bytes written
    async fn download_stream(&self, format: &StreamFormat, dest: &Path) -> Result<u64> {
        let mut request = self.http.get(&format.url);
        for (name, value) in &format.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| StreamError::Transfer {
            format_id: format.format_id.clone(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(StreamError::HttpStatus {
                format_id: format.format_id.clone(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StreamError::Transfer {
                format_id: format.format_id.clone(),
                reason: e.to_string(),
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(StreamError::Empty {
                format_id: format.format_id.clone(),
            }
            .into());
        }

        Ok(written)
    }
}

#[async_trait]
impl ItemProcessor for AudioExtractor {
    async fn process(&self, item: &WorkItem) -> Result<PathBuf> {
        let info = self.source.video_info(item.fetch_id()).await?;

        let format = select_best_audio_format(&info.formats).ok_or_else(|| {
            FetchError::NoAudioFormats {
                fetch_id: item.fetch_id().to_string(),
            }
        })?;
        tracing::debug!(
            fetch_id = item.fetch_id(),
            format_id = %format.format_id,
            bitrate = format.audio_bitrate(),
            ext = %format.ext,
            "Selected audio format"
        );

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let suffix = if format.ext.is_empty() {
            ".tmp".to_string()
        } else {
            format!(".{}", format.ext)
        };
        // Removed when dropped, whichever way this function exits
        let temp = tempfile::Builder::new()
            .prefix("playlist-audio-")
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)?;

        let bytes = self.download_stream(format, temp.path()).await?;
        tracing::debug!(fetch_id = item.fetch_id(), bytes, "Stream saved");

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let title = if info.title.trim().is_empty() {
            item.name()
        } else {
            info.title.as_str()
        };
        let file_name = format!("{}.{}", sanitize_filename(title), self.audio.extension);
        // Dropped on any error below, which frees the name again
        let claim = claim_output_path(&self.output_dir.join(file_name), self.collision)?;

        self.transcoder
            .transcode(temp.path(), claim.path(), &self.audio)
            .await?;
        let target = claim.keep();

        tracing::debug!(
            fetch_id = item.fetch_id(),
            transcoder = self.transcoder.name(),
            path = %target.display(),
            "Transcoded"
        );
        Ok(target)
    }

    fn name(&self) -> &'static str {
        "audio-extractor"
    }
}
