//! Stub collaborators and a local stream server

use async_trait::async_trait;
use playlist_dl::config::AudioConfig;
use playlist_dl::error::{ExtractionError, FetchError};
use playlist_dl::source::{PlaylistEntry, PlaylistListing, StreamFormat, VideoInfo};
use playlist_dl::{ItemProcessor, MediaSource, Result, Transcoder, WorkItem};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Playlist ID served by [`StubSource`]
pub const PLAYLIST_ID: &str = "PLtest123";

/// Playlist URL that resolves to [`PLAYLIST_ID`]
pub const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLtest123";

/// One video served by [`StubSource`]
#[derive(Clone, Debug)]
pub struct StubVideo {
    /// Video ID
    pub id: String,
    /// Title (becomes the output file name)
    pub title: String,
    /// Uploader
    pub uploader: String,
    /// Stream URL for its single audio format
    pub stream_url: String,
}

/// Media source answering from memory
pub struct StubSource {
    videos: Vec<StubVideo>,
    fail_listing: bool,
    pub video_info_calls: AtomicUsize,
}

impl StubSource {
    /// Serve `videos` as the playlist [`PLAYLIST_ID`]
    pub fn new(videos: Vec<StubVideo>) -> Self {
        Self {
            videos,
            fail_listing: false,
            video_info_calls: AtomicUsize::new(0),
        }
    }

    /// A source whose playlist listing always fails
    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl MediaSource for StubSource {
    async fn list_playlist(&self, playlist_id: &str) -> Result<PlaylistListing> {
        if self.fail_listing || playlist_id != PLAYLIST_ID {
            return Err(ExtractionError::ListingFailed {
                playlist_id: playlist_id.to_string(),
                reason: "The playlist does not exist".to_string(),
            }
            .into());
        }
        Ok(PlaylistListing {
            id: PLAYLIST_ID.to_string(),
            title: "Test Playlist".to_string(),
            entries: self
                .videos
                .iter()
                .map(|v| PlaylistEntry {
                    id: v.id.clone(),
                    title: v.title.clone(),
                    uploader: v.uploader.clone(),
                })
                .collect(),
        })
    }

    async fn video_info(&self, fetch_id: &str) -> Result<VideoInfo> {
        self.video_info_calls.fetch_add(1, Ordering::SeqCst);
        let video = self
            .videos
            .iter()
            .find(|v| v.id == fetch_id)
            .ok_or_else(|| FetchError::MetadataFailed {
                fetch_id: fetch_id.to_string(),
                reason: "Video unavailable".to_string(),
            })?;

        Ok(VideoInfo {
            id: video.id.clone(),
            title: video.title.clone(),
            uploader: Some(video.uploader.clone()),
            formats: vec![StreamFormat {
                format_id: "251".to_string(),
                url: video.stream_url.clone(),
                ext: "webm".to_string(),
                acodec: Some("opus".to_string()),
                vcodec: Some("none".to_string()),
                abr: Some(160.0),
                tbr: None,
                http_headers: HashMap::new(),
            }],
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Transcoder that copies the input file to the output path
pub struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, _audio: &AudioConfig) -> Result<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "copy"
    }
}

/// Start a stream server with one route per `(video id, body)`; any other path is a 404
pub async fn stream_server(streams: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;
    for (id, body) in streams {
        Mock::given(method("GET"))
            .and(path(format!("/stream/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.as_bytes().to_vec()))
            .mount(&server)
            .await;
    }
    server
}

/// A video whose stream lives at `<server>/stream/<id>`
pub fn video(server: &MockServer, id: &str, title: &str) -> StubVideo {
    StubVideo {
        id: id.to_string(),
        title: title.to_string(),
        uploader: format!("Artist {id}"),
        stream_url: format!("{}/stream/{}", server.uri(), id),
    }
}

/// Processor that fails every item in `failing`, sleeping `work_time` per call
pub struct FlakyProcessor {
    failing: HashSet<String>,
    work_time: Duration,
    in_flight: AtomicUsize,
    pub high_water: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl FlakyProcessor {
    /// Fail every call for the given fetch IDs
    pub fn failing(ids: &[&str], work_time: Duration) -> Self {
        Self {
            failing: ids.iter().map(|id| id.to_string()).collect(),
            work_time,
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made for `fetch_id`
    pub fn calls_for(&self, fetch_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == fetch_id)
            .count()
    }
}

#[async_trait]
impl ItemProcessor for FlakyProcessor {
    async fn process(&self, item: &WorkItem) -> Result<PathBuf> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(item.fetch_id().to_string());

        tokio::time::sleep(self.work_time).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(item.fetch_id()) {
            Err(playlist_dl::Error::Other(format!(
                "{} is unavailable",
                item.fetch_id()
            )))
        } else {
            Ok(PathBuf::from(format!("{}.mp3", item.fetch_id())))
        }
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Work items `Song <id>` by `Artist <id>`
pub fn work_items(ids: &[&str]) -> Vec<WorkItem> {
    ids.iter()
        .map(|id| WorkItem::new(format!("Song {id}"), format!("Artist {id}"), *id))
        .collect()
}
