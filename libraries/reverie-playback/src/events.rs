//! Playback notifications
//!
//! The engine reports to a host-supplied [`NotificationSink`]:
//! - State changes (playing, paused, stopped, ended) with the active track
//! - Progress while playing, every `progress_interval`

use reverie_metadata::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Topic of state change notifications
pub const STATE_CHANGED_TOPIC: &str = "player.state.changed";

/// Topic of progress notifications
pub const PROGRESS_CHANGED_TOPIC: &str = "player.track.progress.changed";

/// State reported in a state change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateChange {
    Playing,
    Paused,
    Stopped,

    /// Track played through to its end
    Ended,
}

/// Notifications emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum Notification {
    /// Playback state changed
    #[serde(rename = "player.state.changed")]
    StateChanged {
        state: StateChange,
        track: Option<Track>,
    },

    /// Position update while playing
    #[serde(rename = "player.track.progress.changed")]
    Progress { elapsed: Duration, total: Duration },
}

impl Notification {
    /// Topic string hosts route on
    pub fn topic(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => STATE_CHANGED_TOPIC,
            Self::Progress { .. } => PROGRESS_CHANGED_TOPIC,
        }
    }
}

/// Receiver of engine notifications
///
/// Called synchronously from engine methods and from the progress task, so
/// implementations should hand work off rather than block.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn emit(&self, notification: Notification) {
        self(notification);
    }
}

/// Sink that forwards notifications into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink(pub mpsc::UnboundedSender<Notification>);

impl ChannelSink {
    /// Create a sink and the receiver it feeds
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl NotificationSink for ChannelSink {
    fn emit(&self, notification: Notification) {
        if self.0.send(notification).is_err() {
            tracing::trace!("Notification dropped, receiver closed");
        }
    }
}
