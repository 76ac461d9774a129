//! Playlist navigation
//!
//! A cursor over a fixed, shared sequence of tracks. The sequence is never
//! copied or reordered; the cursor only moves an index over it.

use crate::error::{PlaybackError, Result};
use reverie_metadata::Track;
use std::sync::Arc;

/// Cursor over an ordered, immutable sequence of tracks
///
/// The cursor starts unresolved and resolves to the first track on first
/// read. Once resolved, `current` always indexes a track in the sequence.
#[derive(Debug, Clone)]
pub struct PlaylistCursor {
    tracks: Arc<[Track]>,
    current: Option<usize>,
}

impl PlaylistCursor {
    /// Create a cursor positioned (lazily) at the head of `tracks`
    pub fn new(tracks: impl Into<Arc<[Track]>>) -> Self {
        Self {
            tracks: tracks.into(),
            current: None,
        }
    }

    /// Create a cursor positioned at `start`
    pub fn starting_at(tracks: impl Into<Arc<[Track]>>, start: &Track) -> Result<Self> {
        let mut cursor = Self::new(tracks);
        cursor.set_current(start)?;
        Ok(cursor)
    }

    /// Track at the cursor, resolving an unset cursor to the first track
    ///
    /// Returns `None` only when the playlist is empty.
    pub fn current_track(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let index = *self.current.get_or_insert(0);
        self.tracks.get(index)
    }

    pub fn is_at_first(&self) -> bool {
        self.current.unwrap_or(0) == 0
    }

    pub fn is_at_last(&self) -> bool {
        self.current.unwrap_or(0) + 1 >= self.tracks.len()
    }

    /// Move one step toward the end
    ///
    /// Returns `None` and leaves the cursor alone at the last track.
    pub fn advance(&mut self) -> Option<&Track> {
        if self.is_at_last() {
            return None;
        }
        let index = self.current.unwrap_or(0) + 1;
        self.current = Some(index);
        self.tracks.get(index)
    }

    /// Move one step toward the start
    ///
    /// Returns `None` and leaves the cursor alone at the first track.
    pub fn retreat(&mut self) -> Option<&Track> {
        if self.is_at_first() {
            return None;
        }
        let index = self.current.unwrap_or(0) - 1;
        self.current = Some(index);
        self.tracks.get(index)
    }

    /// Move the cursor to `track` and return its index
    pub fn set_current(&mut self, track: &Track) -> Result<usize> {
        let index = self
            .tracks
            .iter()
            .position(|t| t == track)
            .ok_or_else(|| PlaybackError::NotFound(track.path().to_path_buf()))?;
        self.current = Some(index);
        Ok(index)
    }

    /// Put the cursor back where [`position`](Self::position) reported it
    pub(crate) fn restore(&mut self, position: Option<usize>) {
        self.current = position.filter(|&index| index < self.tracks.len());
    }

    /// Resolved cursor index, `None` before first access
    pub fn position(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The shared underlying sequence
    pub fn tracks(&self) -> &Arc<[Track]> {
        &self.tracks
    }
}
