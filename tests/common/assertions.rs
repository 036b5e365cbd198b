//! Custom test assertions for integration tests

use playlist_dl::Event;
use std::path::Path;
use tokio::sync::broadcast;

/// Drain every event currently buffered on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert that files exist in the directory
pub fn assert_files_exist(dir: &Path, expected_files: &[&str]) {
    for filename in expected_files {
        let path = dir.join(filename);
        assert!(
            path.exists(),
            "Expected file '{}' to exist in {:?}",
            filename,
            dir
        );
    }
}

/// Assert that a directory contains exactly `count` entries
pub fn assert_file_count(dir: &Path, count: usize) {
    assert!(dir.exists(), "Directory {:?} does not exist", dir);
    let entries = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .count();
    assert_eq!(entries, count, "Unexpected number of entries in {:?}", dir);
}
