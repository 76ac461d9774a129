/// Track domain type
use crate::id3;
use crate::metadata::{build_metadata, TrackMetadata};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A file in the library together with its decoded tag
///
/// Two tracks are the same track when they point at the same file; metadata
/// does not take part in equality or hashing. Tracks are immutable once
/// built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    source_path: PathBuf,
    metadata: TrackMetadata,
}

impl Track {
    /// Create a track from already-built metadata
    pub fn new(source_path: impl Into<PathBuf>, metadata: TrackMetadata) -> Self {
        Self {
            source_path: source_path.into(),
            metadata,
        }
    }

    /// Create a track by decoding the tag at the start of `bytes`
    pub fn from_bytes(source_path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
        let frames = id3::decode(bytes);
        Self::new(source_path, build_metadata(&frames))
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.source_path
    }

    /// Tag metadata
    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Title for display, falling back to the file name
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.metadata.title {
            return title.clone();
        }

        self.source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.source_path == other.source_path
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_path.hash(state);
    }
}
