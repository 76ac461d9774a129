//! Core types for the playback engine

use crate::backend::AudioBuffer;
use reverie_metadata::Track;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is sounding; offset is zero unless a seek set it
    #[default]
    Stopped,

    /// An output is live and the progress timer is running
    Playing,

    /// Halted mid-track; the offset holds the resume point
    Paused,
}

/// Playback engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between progress notifications while playing (default: 500ms)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(500)
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
        }
    }
}

/// The engine's record of what is loaded and where playback stands
///
/// Exactly one session exists per engine. `decoded_audio` and
/// `active_track` are replaced together when a new track is loaded.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    /// Track whose audio is loaded
    pub active_track: Option<Track>,

    /// Decoded audio for `active_track`
    pub decoded_audio: Option<Arc<AudioBuffer>>,

    /// Current state
    pub state: PlaybackState,

    /// Position to start from on the next (re)start
    pub elapsed_offset: Duration,

    /// Clock reading when the live output was started
    pub started_at: Option<Duration>,
}

impl PlaybackSession {
    /// Elapsed position at clock reading `now`
    ///
    /// While playing this is the stored offset plus the time since the output
    /// started; otherwise it is the stored offset. Never exceeds the duration
    /// of the loaded audio.
    pub fn elapsed_at(&self, now: Duration) -> Duration {
        let running = match (self.state, self.started_at) {
            (PlaybackState::Playing, Some(started_at)) => now.saturating_sub(started_at),
            _ => Duration::ZERO,
        };
        let elapsed = self.elapsed_offset + running;

        match self.total() {
            Some(total) => elapsed.min(total),
            None => elapsed,
        }
    }

    /// Duration of the loaded audio
    pub fn total(&self) -> Option<Duration> {
        self.decoded_audio.as_ref().map(|buffer| buffer.duration())
    }
}
