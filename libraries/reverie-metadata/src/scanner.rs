/// Library scanner implementation
use crate::error::{MetadataError, Result};
use crate::id3::{TagHeader, HEADER_SIZE};
use crate::track::Track;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Supported audio file extensions, lowercase without the dot
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking (default: false)
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".to_string(), "wav".to_string()],
            follow_links: false,
        }
    }
}

/// Scan progress updates
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Scanning started
    Started { total_files: usize },

    /// File scanned
    FileScanned {
        path: PathBuf,
        success: bool,
        error: Option<String>,
    },

    /// Scanning completed
    Completed { stats: ScanStats },
}

/// Scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Number of files discovered
    pub files_discovered: usize,

    /// Number of files turned into tracks
    pub tracks_read: usize,

    /// Number of tracks without any tag metadata
    pub untagged: usize,

    /// Errors encountered
    pub errors: Vec<(PathBuf, String)>,
}

/// Result of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Tracks in discovery order
    pub tracks: Vec<Track>,

    /// Counters and per-file failures
    pub stats: ScanStats,
}

/// Library scanner
///
/// Walks directories for audio files, reads the tag region of each file and
/// decodes it into a [`Track`]. A file that cannot be read is recorded in
/// [`ScanStats::errors`] and the scan carries on.
#[derive(Debug, Clone, Default)]
pub struct LibraryScanner {
    config: ScanConfig,
}

impl LibraryScanner {
    /// Create a new library scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan directories (or single files) for audio files
    ///
    /// # Arguments
    /// * `roots` - Directories or files to scan
    /// * `progress_tx` - Optional channel for progress updates
    pub async fn scan(
        &self,
        roots: &[PathBuf],
        progress_tx: Option<mpsc::Sender<ScanProgress>>,
    ) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        let mut files = Vec::new();
        for root in roots {
            files.extend(self.discover_files(root)?);
        }
        report.stats.files_discovered = files.len();

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(ScanProgress::Started {
                    total_files: files.len(),
                })
                .await;
        }

        for file_path in files {
            let progress = match read_tag_region(&file_path).await {
                Ok(bytes) => {
                    let track = Track::from_bytes(file_path.clone(), &bytes);
                    if track.metadata().is_empty() {
                        report.stats.untagged += 1;
                    }
                    report.stats.tracks_read += 1;
                    report.tracks.push(track);

                    ScanProgress::FileScanned {
                        path: file_path,
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", file_path.display(), e);
                    report.stats.errors.push((file_path.clone(), e.to_string()));

                    ScanProgress::FileScanned {
                        path: file_path,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };

            if let Some(ref tx) = progress_tx {
                let _ = tx.send(progress).await;
            }
        }

        tracing::info!(
            "Scanned {} files: {} tracks, {} untagged, {} errors",
            report.stats.files_discovered,
            report.stats.tracks_read,
            report.stats.untagged,
            report.stats.errors.len()
        );

        if let Some(ref tx) = progress_tx {
            let _ = tx
                .send(ScanProgress::Completed {
                    stats: report.stats.clone(),
                })
                .await;
        }

        Ok(report)
    }

    /// Discover audio files under `path`, sorted for a stable library order
    pub fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.to_path_buf()));
        }

        if path.is_file() {
            return Ok(if self.is_supported_file(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(path)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_supported_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Check if file has one of the configured extensions (case-insensitive)
    pub fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                self.config
                    .extensions
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(e))
            })
    }
}

/// Read the tag header and the tag body it declares
///
/// Audio data after the tag is never read. Files without a tag yield only
/// their first few bytes.
async fn read_tag_region(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE);
    (&mut file)
        .take(HEADER_SIZE as u64)
        .read_to_end(&mut bytes)
        .await?;

    if let Some(header) = TagHeader::parse(&bytes) {
        let body_len = (header.tag_end() - HEADER_SIZE) as u64;
        file.take(body_len).read_to_end(&mut bytes).await?;
    }

    Ok(bytes)
}
