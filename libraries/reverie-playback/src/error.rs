//! Error types for playback

use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Reading the source file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio bytes could not be decoded into a buffer
    #[error("Decode error: {0}")]
    Decode(String),

    /// Output could not be created or started
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Track is not a member of the playlist
    #[error("Track not in playlist: {0}")]
    NotFound(PathBuf),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
