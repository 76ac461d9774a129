/// Metadata-specific errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
///
/// Tag decoding itself never fails: a malformed tag yields the frames read
/// before the damage. These errors cover file access around it.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
