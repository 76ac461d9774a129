//! Platform-agnostic audio backend traits
//!
//! The engine never touches an audio device directly. A backend decodes file
//! bytes into an [`AudioBuffer`] and creates one-shot [`AudioOutput`]s that
//! play a buffer from a given offset. Desktop, test and headless backends all
//! plug in here.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Decoded PCM audio
///
/// Samples are interleaved f32 in [-1.0, 1.0]. The sample data is shared so
/// an output can hold it without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playing time of the whole buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Handle an output uses to report that it played to the end
///
/// Each signal is bound to the session that created its output. The engine
/// drops signals from outputs it has already torn down, so a late report from
/// a stopped output cannot end the track that replaced it.
#[derive(Debug, Clone)]
pub struct EndedSignal {
    session: u64,
    tx: mpsc::UnboundedSender<u64>,
}

impl EndedSignal {
    pub(crate) fn new(session: u64, tx: mpsc::UnboundedSender<u64>) -> Self {
        Self { session, tx }
    }

    /// Session this signal belongs to
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Report a natural end of playback
    pub fn notify(&self) {
        // Engine gone means nobody is listening
        let _ = self.tx.send(self.session);
    }
}

/// A live, one-shot audio output bound to a decoded buffer
///
/// Outputs are connected to the destination when created. Once stopped they
/// are dropped; restarting playback always creates a fresh output.
pub trait AudioOutput: Send {
    /// Begin playback `offset` into the buffer
    fn start(&mut self, offset: Duration) -> Result<()>;

    /// Halt playback immediately
    ///
    /// Stopping must not fire the ended signal.
    fn stop(&mut self);
}

/// Platform audio backend
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Decode a whole file's bytes into PCM
    async fn decode(&self, bytes: Vec<u8>) -> Result<AudioBuffer>;

    /// Create an output that plays `buffer` and calls `ended` when it runs out
    fn create_output(
        &self,
        buffer: Arc<AudioBuffer>,
        ended: EndedSignal,
    ) -> Result<Box<dyn AudioOutput>>;
}

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
