//! Parsers for yt-dlp JSON output

use super::{PlaylistEntry, PlaylistListing, StreamFormat, VideoInfo};
use crate::error::{ExtractionError, FetchError, Result};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    entries: Vec<Option<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVideo {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    url: Option<String>,
    #[serde(default)]
    ext: String,
    acodec: Option<String>,
    vcodec: Option<String>,
    abr: Option<f64>,
    tbr: Option<f64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// Parse `yt-dlp --flat-playlist --dump-single-json` output
///
/// Entries without an ID (deleted or private videos) are dropped. A missing title falls
/// back to the ID so every item stays addressable.
pub fn parse_playlist_json(playlist_id: &str, stdout: &[u8]) -> Result<PlaylistListing> {
    let raw: RawPlaylist =
        serde_json::from_slice(stdout).map_err(|e| ExtractionError::InvalidResponse {
            playlist_id: playlist_id.to_string(),
            reason: e.to_string(),
        })?;

    let entries = raw
        .entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let id = entry.id.filter(|id| !id.is_empty())?;
            Some(PlaylistEntry {
                title: entry.title.unwrap_or_else(|| id.clone()),
                uploader: entry.uploader.or(entry.channel).unwrap_or_default(),
                id,
            })
        })
        .collect();

    Ok(PlaylistListing {
        id: raw.id.unwrap_or_else(|| playlist_id.to_string()),
        title: raw.title.unwrap_or_default(),
        entries,
    })
}

/// Parse `yt-dlp --dump-single-json` output for a single video
///
/// Formats without an ID or URL are dropped.
pub fn parse_video_json(fetch_id: &str, stdout: &[u8]) -> Result<VideoInfo> {
    let raw: RawVideo =
        serde_json::from_slice(stdout).map_err(|e| FetchError::InvalidMetadata {
            fetch_id: fetch_id.to_string(),
            reason: e.to_string(),
        })?;

    let formats = raw
        .formats
        .into_iter()
        .filter_map(|f| {
            Some(StreamFormat {
                format_id: f.format_id?,
                url: f.url?,
                ext: f.ext,
                acodec: f.acodec,
                vcodec: f.vcodec,
                abr: f.abr,
                tbr: f.tbr,
                http_headers: f.http_headers,
            })
        })
        .collect();

    Ok(VideoInfo {
        id: raw.id.unwrap_or_else(|| fetch_id.to_string()),
        title: raw.title.unwrap_or_default(),
        uploader: raw.uploader.or(raw.channel),
        formats,
    })
}
