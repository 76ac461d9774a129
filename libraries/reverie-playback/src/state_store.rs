//! Play-state persistence
//!
//! Hosts keep a small record of whether something is playing and which track
//! played last (for a "now playing" widget or for restoring on launch). The
//! engine writes to it through [`PlayStateStore`].

use reverie_metadata::Track;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared play-state record
pub trait PlayStateStore: Send {
    fn is_playing(&self) -> bool;

    fn set_playing(&mut self, playing: bool);

    fn set_last_played_track(&mut self, track: Track);
}

/// Play state kept in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlayState {
    playing: bool,
    last_played: Option<Track>,
}

impl InMemoryPlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently started track
    pub fn last_played_track(&self) -> Option<&Track> {
        self.last_played.as_ref()
    }
}

impl PlayStateStore for InMemoryPlayState {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn set_last_played_track(&mut self, track: Track) {
        self.last_played = Some(track);
    }
}

/// Lets a host keep a handle on the store it gave to the engine
impl<T: PlayStateStore> PlayStateStore for Arc<Mutex<T>> {
    fn is_playing(&self) -> bool {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_playing()
    }

    fn set_playing(&mut self, playing: bool) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_playing(playing);
    }

    fn set_last_played_track(&mut self, track: Track) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_last_played_track(track);
    }
}
