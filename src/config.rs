//! Configuration types for playlist-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Download behavior configuration (directories, concurrency, collisions)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root output directory; each playlist gets a folder beneath it (default: "./downloads")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for in-flight stream files (default: system temp dir)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Maximum items processed at once (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// What to do when the output file already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,

    /// Prefix for the default per-playlist folder name (default: "playlist_")
    #[serde(default = "default_playlist_folder_prefix")]
    pub playlist_folder_prefix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: None,
            max_concurrent: default_max_concurrent(),
            file_collision: FileCollisionAction::default(),
            playlist_folder_prefix: default_playlist_folder_prefix(),
        }
    }
}

impl DownloadConfig {
    /// Directory to create stream temp files in
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// External tool paths (yt-dlp, ffmpeg)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Output audio encoding settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Encoder passed to the transcoder (default: "libmp3lame")
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Target bitrate (default: "192k")
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Output file extension without the dot (default: "mp3")
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            bitrate: default_bitrate(),
            extension: default_extension(),
        }
    }
}

/// Delay growth between attempts
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay multiplied after every retry, capped at `max_delay`
    Exponential {
        /// Multiplier applied after each retry
        #[serde(default = "default_backoff_multiplier")]
        multiplier: f64,
        /// Upper bound for a single delay
        #[serde(default = "default_max_delay", with = "duration_serde")]
        max_delay: Duration,
    },
}

/// Retry configuration for per-item failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per item, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before each retry (default: 2 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,

    /// How the delay evolves between retries (default: fixed)
    #[serde(default)]
    pub backoff: Backoff,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
            backoff: Backoff::Fixed,
            jitter: false,
        }
    }
}

/// File collision action
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Replace the existing file (default)
    #[default]
    Overwrite,
    /// Append (1), (2), etc. to the filename
    Rename,
    /// Fail the item, leaving the existing file alone
    Skip,
}

/// Main configuration for the playlist downloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig): directories, concurrency, collisions
/// - [`retry`](RetryConfig): per-item retry policy
/// - [`tools`](ToolsConfig): external binary paths
/// - [`audio`](AudioConfig): output encoding
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Output encoding
    #[serde(default)]
    pub audio: AudioConfig,
}

impl Config {
    /// Load a JSON configuration file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent == 0 {
            return Err(config_error("max_concurrent must be at least 1", "max_concurrent"));
        }
        if self.retry.max_attempts == 0 {
            return Err(config_error(
                "max_attempts must be at least 1",
                "retry.max_attempts",
            ));
        }
        if let Backoff::Exponential { multiplier, .. } = self.retry.backoff
            && !(multiplier.is_finite() && multiplier > 0.0)
        {
            return Err(config_error(
                "backoff multiplier must be a positive finite number",
                "retry.backoff.multiplier",
            ));
        }
        if self.audio.codec.trim().is_empty() {
            return Err(config_error("audio codec must not be empty", "audio.codec"));
        }
        if self.audio.extension.trim().is_empty() {
            return Err(config_error(
                "audio extension must not be empty",
                "audio.extension",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent() -> usize {
    5
}

fn default_playlist_folder_prefix() -> String {
    "playlist_".to_string()
}

fn default_true() -> bool {
    true
}

fn default_codec() -> String {
    "libmp3lame".to_string()
}

fn default_bitrate() -> String {
    "192k".to_string()
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (integer milliseconds, so sub-second delays survive)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
