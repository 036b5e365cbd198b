//! Compare concurrent and sequential download of the same playlist
//!
//! Usage: cargo run --release --example speedtest -- <playlist-url> [output-dir]
//!
//! Writes to `<output-dir>/playlist_<id>_concurrent` and `..._sequential`.

use playlist_dl::config::{Config, DownloadConfig};
use playlist_dl::{BatchResult, PlaylistDownloader};
use tracing_subscriber::EnvFilter;

fn print_failures(label: &str, result: &BatchResult) {
    if result.is_success() {
        return;
    }
    println!();
    println!("{} download errors:", label);
    for failure in &result.failures {
        println!("  {}", failure);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playlist_dl=warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: speedtest <playlist-url> [output-dir]");
        std::process::exit(2);
    };
    let output_dir = args.next().unwrap_or_else(|| "downloads".to_string());

    let config = Config {
        download: DownloadConfig {
            output_dir: output_dir.into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let downloader = PlaylistDownloader::new(config)?;

    let playlist = downloader.fetch_playlist(&url).await?;
    let base_dir = downloader.output_dir_for(&playlist, None);

    println!("═══════════════════════════════════════════════════════════");
    println!("  playlist-dl Speedtest");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Playlist: {} ({} songs)", playlist.name, playlist.items.len());
    println!(
        "  Concurrency: {}",
        downloader.config().download.max_concurrent
    );
    println!("  Output: {}_*", base_dir.display());
    println!("═══════════════════════════════════════════════════════════");

    let comparison = downloader.compare_runners(&playlist, &base_dir).await?;

    println!("Concurrent download time: {:.2?}", comparison.concurrent);
    println!("Sequential download time: {:.2?}", comparison.sequential);
    println!("Speed improvement: {:.2}%", comparison.improvement_percent());

    print_failures("Concurrent", &comparison.concurrent_result);
    print_failures("Sequential", &comparison.sequential_result);

    if comparison.concurrent_result.is_success() && comparison.sequential_result.is_success() {
        println!();
        println!("All downloads completed successfully!");
    }

    Ok(())
}
