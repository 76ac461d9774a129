/// Reverie - music library tag inspector, scanner and headless player
use anyhow::Context;
use clap::{Parser, Subcommand};
use reverie_cli::{HeadlessBackend, ReverieConfig};
use reverie_metadata::{id3, FrameValue, LibraryScanner, ScanProgress, Track};
use reverie_playback::{FsStorage, Notification, PlaybackEngine, PlaybackState};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reverie")]
#[command(about = "Reverie music library tools", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./reverie.toml if present)
    #[arg(short, long, global = true, env = "REVERIE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tag metadata of an audio file
    Tags {
        /// Audio file to inspect
        file: PathBuf,

        /// List raw frames instead of metadata
        #[arg(long)]
        frames: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan directories for audio files and list their tracks
    Scan {
        /// Directories to scan (default: library.directories)
        dirs: Vec<PathBuf>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Play files or directories as a playlist without an audio device
    Play {
        /// Files or directories (default: library.directories)
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ReverieConfig::load(cli.config.as_deref())?;

    // Initialize tracing; RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Tags { file, frames, json } => show_tags(&file, frames, json).await,
        Commands::Scan { dirs, json } => scan(&config, dirs, json).await,
        Commands::Play { paths } => play(&config, paths).await,
    }
}

async fn show_tags(path: &Path, frames: bool, json: bool) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if frames {
        let frames = id3::decode(&bytes);
        if json {
            println!("{}", serde_json::to_string_pretty(&frames)?);
        } else {
            for frame in &frames {
                let value = match &frame.value {
                    FrameValue::Text(text) => text.clone(),
                    FrameValue::Binary(data) => format!("<{} bytes>", data.len()),
                };
                let language = frame.language.as_deref().unwrap_or("");
                println!("{} {:>8} {:3} {}", frame.id, frame.size_in_buffer, language, value);
            }
        }
        return Ok(());
    }

    let track = Track::from_bytes(path, &bytes);
    if json {
        println!("{}", serde_json::to_string_pretty(&track)?);
        return Ok(());
    }

    let metadata = track.metadata();
    let fields = [
        ("Title", metadata.title.clone()),
        ("Artist", metadata.artist.clone()),
        ("Album artist", metadata.album_artist.clone()),
        ("Album", metadata.album.clone()),
        ("Genre", metadata.genre.clone()),
        ("Year", metadata.year.map(|y| y.to_string())),
        ("Publisher", metadata.publisher.clone()),
        ("Track", position(metadata.track_number, metadata.track_total)),
        ("Disc", position(metadata.disc_number, metadata.disc_total)),
        ("Comment", metadata.comment.clone()),
        (
            "Album art",
            metadata.album_art.as_ref().map(|art| {
                format!(
                    "{} ({} bytes)",
                    art.mime_type.as_deref().unwrap_or("unknown type"),
                    art.data.len()
                )
            }),
        ),
    ];

    println!("{}", path.display());
    if metadata.is_empty() {
        println!("  (no tag)");
    }
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {:<13} {}", label, value);
        }
    }
    Ok(())
}

fn position(number: Option<u32>, total: Option<u32>) -> Option<String> {
    match (number, total) {
        (Some(n), Some(t)) => Some(format!("{}/{}", n, t)),
        (Some(n), None) => Some(n.to_string()),
        (None, Some(t)) => Some(format!("?/{}", t)),
        (None, None) => None,
    }
}

fn resolve_roots(config: &ReverieConfig, given: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let roots = if given.is_empty() {
        config.library.directories.clone()
    } else {
        given
    };

    if roots.is_empty() {
        anyhow::bail!("Nothing to scan: pass paths or set library.directories");
    }
    Ok(roots)
}

async fn scan(config: &ReverieConfig, dirs: Vec<PathBuf>, json: bool) -> anyhow::Result<()> {
    let roots = resolve_roots(config, dirs)?;
    let scanner = LibraryScanner::with_config(config.scan_config());

    let (tx, mut rx) = mpsc::channel(64);
    let progress = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            match update {
                ScanProgress::Started { total_files } => {
                    tracing::info!("Found {} audio files", total_files);
                }
                ScanProgress::FileScanned { path, success, .. } => {
                    tracing::debug!("Scanned {} (ok: {})", path.display(), success);
                }
                ScanProgress::Completed { .. } => {}
            }
        }
    });

    let report = scanner.scan(&roots, Some(tx)).await?;
    progress.await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.tracks)?);
        return Ok(());
    }

    for track in &report.tracks {
        let artist = track.metadata().artist.as_deref().unwrap_or("Unknown artist");
        println!("{}\t{} - {}", track.path().display(), artist, track.display_title());
    }
    println!(
        "{} tracks ({} untagged, {} errors)",
        report.stats.tracks_read,
        report.stats.untagged,
        report.stats.errors.len()
    );
    Ok(())
}

async fn play(config: &ReverieConfig, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let roots = resolve_roots(config, paths)?;
    let report = LibraryScanner::with_config(config.scan_config())
        .scan(&roots, None)
        .await?;
    if report.tracks.is_empty() {
        anyhow::bail!("No playable tracks found");
    }

    let sink = Arc::new(|notification: Notification| print_notification(&notification));
    let mut engine = PlaybackEngine::new(
        Arc::new(FsStorage::new()),
        Arc::new(HeadlessBackend::new()),
        sink,
    )
    .with_config(config.playback_config());

    engine.play_playlist(report.tracks, None).await?;

    loop {
        let interrupted = tokio::select! {
            result = engine.wait_for_end() => {
                result?;
                false
            }
            _ = tokio::signal::ctrl_c() => true,
        };

        if interrupted {
            engine.stop();
            break;
        }
        if engine.state() != PlaybackState::Playing {
            break;
        }
    }
    Ok(())
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::StateChanged { state, track } => {
            let title = track.as_ref().map_or_else(String::new, Track::display_title);
            println!("\n[{:?}] {}", state, title);
        }
        Notification::Progress { elapsed, total } => {
            print!("\r  {} / {}", clock_time(*elapsed), clock_time(*total));
            let _ = std::io::stdout().flush();
        }
    }
}

fn clock_time(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
