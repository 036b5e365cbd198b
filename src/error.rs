//! Error types for playlist-dl
//!
//! This module provides the error taxonomy for the library:
//! - Domain-specific error types (Extraction, Fetch, Stream, Encode)
//! - Retry exhaustion wrapping the last underlying cause
//! - Machine-readable error codes for reporting

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for playlist-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent")
        key: Option<String>,
    },

    /// Playlist lookup or parsing failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Per-video metadata or stream resolution failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Transferring the resolved stream failed
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Transcoding failed
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp, ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The item processor panicked during an attempt
    #[error("processor panicked: {0}")]
    Panicked(String),

    /// A spawned batch task could not be joined
    #[error("batch task failed: {0}")]
    TaskFailed(String),

    /// Every attempt failed; carries the cause of the last one
    #[error("failed after {attempts} attempts: {source}")]
    RetryExhausted {
        /// Number of attempts that were made
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        source: Box<Error>,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Extraction(e) => match e {
                ExtractionError::InvalidUrl { .. } => "invalid_url",
                ExtractionError::UnsupportedHost { .. } => "unsupported_host",
                ExtractionError::PlaylistIdNotFound { .. } => "playlist_id_not_found",
                ExtractionError::ListingFailed { .. } => "listing_failed",
                ExtractionError::InvalidResponse { .. } => "invalid_playlist_response",
            },
            Error::Fetch(e) => match e {
                FetchError::MetadataFailed { .. } => "metadata_failed",
                FetchError::InvalidMetadata { .. } => "invalid_metadata",
                FetchError::NoAudioFormats { .. } => "no_audio_formats",
            },
            Error::Stream(e) => match e {
                StreamError::HttpStatus { .. } => "stream_http_status",
                StreamError::Transfer { .. } => "stream_transfer_failed",
                StreamError::Empty { .. } => "stream_empty",
            },
            Error::Encode(e) => match e {
                EncodeError::Failed { .. } => "encode_failed",
                EncodeError::MissingOutput { .. } => "encode_missing_output",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Panicked(_) => "processor_panicked",
            Error::TaskFailed(_) => "task_failed",
            Error::RetryExhausted { .. } => "retry_exhausted",
            Error::Other(_) => "internal_error",
        }
    }

    /// The innermost cause, looking through any `RetryExhausted` wrapping
    pub fn last_cause(&self) -> &Error {
        match self {
            Error::RetryExhausted { source, .. } => source.last_cause(),
            other => other,
        }
    }
}

/// Playlist lookup and parsing errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The playlist URL could not be parsed
    #[error("failed to parse URL {url}: {reason}")]
    InvalidUrl {
        /// The URL as given
        url: String,
        /// Parser message
        reason: String,
    },

    /// The URL does not point at a supported video platform
    #[error("invalid YouTube URL: unsupported host {host}")]
    UnsupportedHost {
        /// The host found in the URL
        host: String,
    },

    /// Neither the query string nor the path carried a playlist ID
    #[error("playlist ID not found in URL {url}")]
    PlaylistIdNotFound {
        /// The URL as given
        url: String,
    },

    /// The remote listing call failed
    #[error("failed to list playlist {playlist_id}: {reason}")]
    ListingFailed {
        /// The playlist that was being listed
        playlist_id: String,
        /// The reason listing failed
        reason: String,
    },

    /// The listing call succeeded but its output could not be understood
    #[error("invalid playlist response for {playlist_id}: {reason}")]
    InvalidResponse {
        /// The playlist that was being listed
        playlist_id: String,
        /// What was wrong with the response
        reason: String,
    },
}

/// Per-video metadata and stream resolution errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Video metadata could not be retrieved
    #[error("failed to get video info for {fetch_id}: {reason}")]
    MetadataFailed {
        /// The video that was being resolved
        fetch_id: String,
        /// The reason resolution failed
        reason: String,
    },

    /// Video metadata was retrieved but could not be parsed
    #[error("invalid video info for {fetch_id}: {reason}")]
    InvalidMetadata {
        /// The video that was being resolved
        fetch_id: String,
        /// What was wrong with the metadata
        reason: String,
    },

    /// The video has no format carrying an audio track
    #[error("no formats with audio channels available for {fetch_id}")]
    NoAudioFormats {
        /// The video without audio formats
        fetch_id: String,
    },
}

/// Stream transfer errors
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream URL answered with a non-success status
    #[error("stream request for format {format_id} returned HTTP {status}")]
    HttpStatus {
        /// The format being fetched
        format_id: String,
        /// HTTP status code
        status: u16,
    },

    /// The transfer broke off part way
    #[error("failed to save audio for format {format_id}: {reason}")]
    Transfer {
        /// The format being fetched
        format_id: String,
        /// The reason the transfer failed
        reason: String,
    },

    /// The stream completed without delivering any bytes
    #[error("stream for format {format_id} was empty")]
    Empty {
        /// The format being fetched
        format_id: String,
    },
}

/// Transcoding errors
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The transcoder exited unsuccessfully
    #[error("failed to convert audio to {output}: {reason}\ntranscoder output: {stderr}")]
    Failed {
        /// The file that was being produced
        output: PathBuf,
        /// Exit status description
        reason: String,
        /// Captured transcoder diagnostics
        stderr: String,
    },

    /// The transcoder reported success but produced nothing
    #[error("transcoder reported success but {output} was not written")]
    MissingOutput {
        /// The file that should have been produced
        output: PathBuf,
    },
}
