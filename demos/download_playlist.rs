//! Download a playlist as MP3 files
//!
//! Usage: cargo run --example download_playlist -- <playlist-url> [output-dir] [folder-name]
//!
//! Requires `yt-dlp` and `ffmpeg` on PATH. Set `RUST_LOG=playlist_dl=debug` for more detail.

use playlist_dl::config::{Config, DownloadConfig};
use playlist_dl::{Event, PlaylistDownloader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playlist_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: download_playlist <playlist-url> [output-dir] [folder-name]");
        std::process::exit(2);
    };
    let output_dir = args.next().unwrap_or_else(|| "downloads".to_string());
    let folder_name = args.next();

    let config = Config {
        download: DownloadConfig {
            output_dir: output_dir.into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let downloader = PlaylistDownloader::new(config)?;

    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::BatchStarted { total, limit } => {
                    println!("Downloading {} songs, {} at a time", total, limit);
                }
                Event::AttemptFailed {
                    name,
                    attempt,
                    error,
                    ..
                } => {
                    println!("Attempt {} failed for {}: {}. Retrying...", attempt, name, error);
                }
                Event::ItemCompleted { name, .. } => {
                    println!("Downloaded: {}", name);
                }
                _ => {}
            }
        }
    });

    let report = downloader
        .process_playlist(&url, folder_name.as_deref())
        .await?;

    println!();
    println!(
        "Playlist \"{}\" -> {} ({:.1?})",
        report.playlist.name,
        report.output_dir.display(),
        report.elapsed
    );
    if report.is_success() {
        println!("All downloads completed successfully!");
    } else {
        println!("Download errors:");
        for failure in &report.result.failures {
            println!("  {}", failure);
        }
    }

    Ok(())
}
