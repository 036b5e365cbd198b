//! Playlist URLs and expansion into work items

use crate::error::{ExtractionError, Result};
use crate::source::{MediaSource, PlaylistListing};
use crate::types::WorkItem;
use url::{Url, form_urlencoded};

/// Hosts accepted as playlist sources
const SUPPORTED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Extract the playlist ID from a playlist URL
///
/// The `list` query parameter wins; otherwise the path segment after `playlist` is used.
///
/// # Examples
///
/// ```
/// use playlist_dl::playlist::extract_playlist_id;
///
/// let id = extract_playlist_id("https://www.youtube.com/playlist?list=PL590L5WQmH8fJ54F369BLDSqIwcs-TCfs").unwrap();
/// assert_eq!(id, "PL590L5WQmH8fJ54F369BLDSqIwcs-TCfs");
/// ```
pub fn extract_playlist_id(link: &str) -> std::result::Result<String, ExtractionError> {
    let parsed = Url::parse(link.trim()).map_err(|e| ExtractionError::InvalidUrl {
        url: link.to_string(),
        reason: e.to_string(),
    })?;

    let host = parsed.host_str().unwrap_or_default();
    if !SUPPORTED_HOSTS.iter().any(|h| host.contains(h)) {
        return Err(ExtractionError::UnsupportedHost {
            host: host.to_string(),
        });
    }

    if let Some((_, list)) = parsed.query_pairs().find(|(k, v)| k == "list" && !v.is_empty()) {
        return Ok(list.into_owned());
    }

    let segments: Vec<&str> = parsed.path().split('/').collect();
    segments
        .windows(2)
        .find(|pair| pair[0] == "playlist" && !pair[1].is_empty())
        .map(|pair| pair[1].to_string())
        .ok_or_else(|| ExtractionError::PlaylistIdNotFound {
            url: link.to_string(),
        })
}

/// Watch page URL for a video ID
pub fn watch_url(fetch_id: &str) -> String {
    with_query("https://www.youtube.com/watch", "v", fetch_id)
}

/// Listing URL for a playlist ID
pub fn playlist_url(playlist_id: &str) -> String {
    with_query("https://www.youtube.com/playlist", "list", playlist_id)
}

/// `base?key=value` with the value form-encoded
fn with_query(base: &str, key: &str, value: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    format!("{base}?{query}")
}

/// A named playlist expanded into work items
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    /// Playlist ID
    pub id: String,
    /// Playlist title
    pub name: String,
    /// One work item per video, in playlist order
    pub items: Vec<WorkItem>,
}

impl Playlist {
    /// Convert a listing into work items
    pub fn from_listing(listing: PlaylistListing) -> Self {
        let items = listing
            .entries
            .into_iter()
            .map(|entry| WorkItem::new(entry.title, entry.uploader, entry.id))
            .collect();
        Self {
            id: listing.id,
            name: listing.title,
            items,
        }
    }

    /// Folder name used when the caller does not choose one: `prefix` followed by the ID
    pub fn default_folder_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.id)
    }
}

/// Resolve a playlist URL and list its videos
///
/// # Errors
///
/// Any failure here is an [`ExtractionError`]: no items exist yet, so nothing is retried.
pub async fn fetch_playlist(source: &dyn MediaSource, link: &str) -> Result<Playlist> {
    let playlist_id = extract_playlist_id(link)?;
    tracing::debug!(playlist_id = %playlist_id, source = source.name(), "Listing playlist");

    let listing = source.list_playlist(&playlist_id).await?;
    let playlist = Playlist::from_listing(listing);

    tracing::info!(
        playlist_id = %playlist.id,
        name = %playlist.name,
        items = playlist.items.len(),
        "Playlist listed"
    );
    Ok(playlist)
}
