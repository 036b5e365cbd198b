//! End-to-end playlist processing against stub collaborators
//!
//! The media source and transcoder are in-memory stubs; audio streams are served by a
//! local wiremock server, so these tests exercise the real HTTP download path, retry and
//! batch aggregation without yt-dlp, ffmpeg or network access.

mod common;

use common::{
    CopyTranscoder, PLAYLIST_ID, PLAYLIST_URL, StubSource, assert_file_count, assert_files_exist,
    drain_events, stream_server, video,
};
use playlist_dl::config::{Config, RetryConfig};
use playlist_dl::{Error, Event, ExtractionError, ItemState, PlaylistDownloader};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;

fn test_config(output: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.output_dir = output.path().join("music");
    config.download.temp_dir = Some(output.path().join("tmp"));
    config.download.max_concurrent = 2;
    config.retry = RetryConfig {
        max_attempts: 3,
        delay: Duration::from_millis(5),
        ..RetryConfig::default()
    };
    config
}

#[tokio::test]
async fn playlist_is_downloaded_and_failures_reported() {
    let server = stream_server(&[("v1", "first song"), ("v3", "third song")]).await;
    let source = Arc::new(StubSource::new(vec![
        video(&server, "v1", "First: Song"),
        video(&server, "v2", "Missing Song"),
        video(&server, "v3", "Third Song"),
    ]));
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source.clone(),
        Arc::new(CopyTranscoder),
    );

    let report = downloader
        .process_playlist(PLAYLIST_URL, None)
        .await
        .unwrap();

    let expected_dir = output.path().join("music").join(format!("playlist_{PLAYLIST_ID}"));
    assert_eq!(report.output_dir, expected_dir);
    assert_eq!(report.playlist.name, "Test Playlist");
    assert!(!report.is_success());

    assert_eq!(report.result.failed_ids(), vec!["v2"]);
    let failure = &report.result.failures[0];
    assert!(matches!(
        failure.cause,
        Error::RetryExhausted { attempts: 3, .. }
    ));
    assert!(
        failure
            .to_string()
            .starts_with("failed to download Missing Song by Artist v2: failed after 3 attempts")
    );

    assert_files_exist(&expected_dir, &["First_ Song.mp3", "Third Song.mp3"]);
    assert_file_count(&expected_dir, 2);
    assert_eq!(
        std::fs::read(expected_dir.join("Third Song.mp3")).unwrap(),
        b"third song"
    );
    // v1 and v3 once each, v2 three times
    assert_eq!(source.video_info_calls.load(Ordering::SeqCst), 5);
    assert_file_count(&output.path().join("tmp"), 0);
}

#[tokio::test]
async fn custom_folder_name_is_used() {
    let server = stream_server(&[("v1", "data")]).await;
    let source = Arc::new(StubSource::new(vec![video(&server, "v1", "Song")]));
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source,
        Arc::new(CopyTranscoder),
    );

    let report = downloader
        .process_playlist(PLAYLIST_URL, Some("road trip"))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.output_dir, output.path().join("music").join("road trip"));
    assert_files_exist(&report.output_dir, &["Song.mp3"]);
}

#[tokio::test]
async fn listing_failure_aborts_before_any_item_runs() {
    let source = Arc::new(StubSource::failing_listing());
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source.clone(),
        Arc::new(CopyTranscoder),
    );
    let mut events = downloader.subscribe();

    let err = downloader
        .process_playlist(PLAYLIST_URL, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::ListingFailed { .. })
    ));
    assert_eq!(source.video_info_calls.load(Ordering::SeqCst), 0);
    assert!(drain_events(&mut events).is_empty());
    assert!(!output.path().join("music").exists());
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        Arc::new(StubSource::new(Vec::new())),
        Arc::new(CopyTranscoder),
    );

    let err = downloader
        .process_playlist("https://example.com/playlist?list=PLx", None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "unsupported_host");
}

#[tokio::test]
async fn events_trace_each_item_to_a_terminal_state() {
    let server = stream_server(&[("ok", "audio")]).await;
    let source = Arc::new(StubSource::new(vec![
        video(&server, "ok", "Good"),
        video(&server, "gone", "Bad"),
    ]));
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source,
        Arc::new(CopyTranscoder),
    );
    let mut rx = downloader.subscribe();

    let report = downloader
        .process_playlist(PLAYLIST_URL, None)
        .await
        .unwrap();
    assert_eq!(report.result.failures.len(), 1);

    let mut last_state: HashMap<String, ItemState> = HashMap::new();
    for event in drain_events(&mut rx) {
        if let (Some(id), Some(state)) = (event.fetch_id(), event.item_state()) {
            last_state.insert(id.to_string(), state);
        }
    }
    assert_eq!(last_state.get("ok"), Some(&ItemState::Succeeded));
    assert_eq!(last_state.get("gone"), Some(&ItemState::FailedExhausted));
}

#[tokio::test]
async fn compare_runners_downloads_into_two_directories() {
    let server = stream_server(&[("a", "aaa"), ("b", "bbb"), ("c", "ccc")]).await;
    let source = Arc::new(StubSource::new(vec![
        video(&server, "a", "Alpha"),
        video(&server, "b", "Beta"),
        video(&server, "c", "Gamma"),
    ]));
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source,
        Arc::new(CopyTranscoder),
    );

    let playlist = downloader.fetch_playlist(PLAYLIST_URL).await.unwrap();
    let base = downloader.output_dir_for(&playlist, Some("mix"));
    let comparison = downloader.compare_runners(&playlist, &base).await.unwrap();

    assert!(comparison.concurrent_result.is_success());
    assert!(comparison.sequential_result.is_success());

    let music = output.path().join("music");
    for dir in ["mix_concurrent", "mix_sequential"] {
        assert_files_exist(&music.join(dir), &["Alpha.mp3", "Beta.mp3", "Gamma.mp3"]);
    }
    assert!(comparison.improvement_percent().is_finite());
}

#[tokio::test]
async fn skip_collision_marks_existing_files_as_failures() {
    let server = stream_server(&[("v1", "new")]).await;
    let source = Arc::new(StubSource::new(vec![video(&server, "v1", "Song")]));
    let output = TempDir::new().unwrap();
    let mut config = test_config(&output);
    config.download.file_collision = playlist_dl::FileCollisionAction::Skip;
    config.retry.max_attempts = 1;

    let target_dir = output.path().join("music").join("keep");
    std::fs::create_dir_all(&target_dir).unwrap();
    std::fs::write(target_dir.join("Song.mp3"), b"old").unwrap();

    let downloader =
        PlaylistDownloader::with_components(config, source, Arc::new(CopyTranscoder));
    let report = downloader
        .process_playlist(PLAYLIST_URL, Some("keep"))
        .await
        .unwrap();

    assert_eq!(report.result.failed_ids(), vec!["v1"]);
    assert_eq!(std::fs::read(target_dir.join("Song.mp3")).unwrap(), b"old");
}

#[tokio::test]
async fn events_start_with_batch_started() {
    let server = stream_server(&[("v1", "data")]).await;
    let source = Arc::new(StubSource::new(vec![video(&server, "v1", "Song")]));
    let output = TempDir::new().unwrap();
    let downloader = PlaylistDownloader::with_components(
        test_config(&output),
        source,
        Arc::new(CopyTranscoder),
    );
    let mut rx = downloader.subscribe();

    let _report = downloader.process_playlist(PLAYLIST_URL, None).await.unwrap();

    let events = drain_events(&mut rx);
    assert!(matches!(
        events.first(),
        Some(Event::BatchStarted { total: 1, limit: 2 })
    ));
    assert!(matches!(
        events.last(),
        Some(Event::BatchFinished { failed: 0, .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_titled_videos_are_all_kept_under_rename() {
    let server = stream_server(&[("s1", "one"), ("s2", "two"), ("s3", "three")]).await;
    let source = Arc::new(StubSource::new(vec![
        video(&server, "s1", "Same Song"),
        video(&server, "s2", "Same Song"),
        video(&server, "s3", "Same Song"),
    ]));
    let output = TempDir::new().unwrap();
    let mut config = test_config(&output);
    config.download.max_concurrent = 3;
    config.download.file_collision = playlist_dl::FileCollisionAction::Rename;

    let downloader =
        PlaylistDownloader::with_components(config, source, Arc::new(CopyTranscoder));
    let report = downloader
        .process_playlist(PLAYLIST_URL, Some("dupes"))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_files_exist(
        &report.output_dir,
        &["Same Song.mp3", "Same Song (1).mp3", "Same Song (2).mp3"],
    );
    assert_file_count(&report.output_dir, 3);

    let mut contents: Vec<Vec<u8>> = ["Same Song.mp3", "Same Song (1).mp3", "Same Song (2).mp3"]
        .iter()
        .map(|name| std::fs::read(report.output_dir.join(name)).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![b"one".to_vec(), b"three".to_vec(), b"two".to_vec()]);
}
