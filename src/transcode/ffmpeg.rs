//! ffmpeg-based transcoder

use super::Transcoder;
use crate::config::AudioConfig;
use crate::error::EncodeError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Transcoder that runs the external `ffmpeg` binary
///
/// # Examples
///
/// ```no_run
/// use playlist_dl::config::AudioConfig;
/// use playlist_dl::transcode::{FfmpegTranscoder, Transcoder};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ffmpeg = FfmpegTranscoder::from_path().expect("ffmpeg not found in PATH");
/// ffmpeg
///     .transcode(Path::new("in.webm"), Path::new("out.mp3"), &AudioConfig::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary_path: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a transcoder with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    /// Path of the binary this transcoder runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Command-line arguments for one conversion
    ///
    /// Video is dropped, the output is overwritten, and only errors are logged.
    pub fn build_args(input: &Path, output: &Path, audio: &AudioConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.into());
        args.extend(
            [
                "-vn",
                "-acodec",
                audio.codec.as_str(),
                "-b:a",
                audio.bitrate.as_str(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        audio: &AudioConfig,
    ) -> crate::Result<()> {
        let args = Self::build_args(input, output, audio);
        tracing::debug!(binary = %self.binary_path.display(), ?args, "Running ffmpeg");

        let result = Command::new(&self.binary_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))?;

        if !result.status.success() {
            return Err(EncodeError::Failed {
                output: output.to_path_buf(),
                reason: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            }
            .into());
        }

        // An empty file is the collision placeholder left untouched
        let written = tokio::fs::metadata(output)
            .await
            .is_ok_and(|meta| meta.len() > 0);
        if !written {
            return Err(EncodeError::MissingOutput {
                output: output.to_path_buf(),
            }
            .into());
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
