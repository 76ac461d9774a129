//! Reverie - Playback Engine
//!
//! Platform-agnostic playback control for Reverie.
//!
//! This crate provides:
//! - [`PlaybackEngine`], a play/pause/resume/stop/seek state machine over one
//!   decoded track at a time
//! - [`PlaylistCursor`] navigation with automatic advance on natural end
//! - Progress and state notifications through a [`NotificationSink`]
//!
//! # Architecture
//!
//! The engine owns no audio device and no filesystem. Everything outside the
//! state machine is a trait:
//! - [`Storage`] reads source files ([`FsStorage`] for local disk)
//! - [`AudioBackend`] decodes bytes and creates [`AudioOutput`]s
//! - [`Clock`] measures elapsed time ([`SystemClock`] by default)
//! - [`PlayStateStore`] records what is playing for the host
//!
//! # Example
//!
//! ```rust,no_run
//! use reverie_metadata::Track;
//! use reverie_playback::{AudioBackend, ChannelSink, FsStorage, PlaybackEngine};
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<dyn AudioBackend>) -> reverie_playback::Result<()> {
//! let (sink, mut notifications) = ChannelSink::channel();
//! let mut engine = PlaybackEngine::new(Arc::new(FsStorage::new()), backend, Arc::new(sink));
//!
//! let track = Track::new("/music/song.mp3", Default::default());
//! engine.play(Some(track)).await?;
//! engine.pause();
//! engine.resume()?;
//!
//! while let Some(notification) = notifications.recv().await {
//!     println!("{}: {:?}", notification.topic(), notification);
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod engine;
mod error;
mod events;
mod playlist;
mod progress;
mod state_store;
mod storage;
mod types;

pub use backend::{AudioBackend, AudioBuffer, AudioOutput, Clock, EndedSignal, SystemClock};
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::{
    ChannelSink, Notification, NotificationSink, StateChange, PROGRESS_CHANGED_TOPIC,
    STATE_CHANGED_TOPIC,
};
pub use playlist::PlaylistCursor;
pub use state_store::{InMemoryPlayState, PlayStateStore};
pub use storage::{FsStorage, Storage};
pub use types::{PlaybackConfig, PlaybackSession, PlaybackState};
