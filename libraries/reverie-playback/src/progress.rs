//! Periodic progress reporting while playing

use crate::backend::Clock;
use crate::events::{Notification, NotificationSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Where playback stood when the output was started
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressAnchor {
    pub offset: Duration,
    pub started_at: Duration,
    pub total: Duration,
}

impl ProgressAnchor {
    fn elapsed(&self, now: Duration) -> Duration {
        (self.offset + now.saturating_sub(self.started_at)).min(self.total)
    }
}

/// Recurring progress task
///
/// The first report comes one interval after start. The task is aborted when
/// the timer is dropped, so no report can follow the exit from playing.
#[derive(Debug)]
pub(crate) struct ProgressTimer {
    handle: JoinHandle<()>,
}

impl ProgressTimer {
    /// Spawn the task on the current tokio runtime
    ///
    /// `None` when `interval` is zero or when called outside a runtime.
    pub fn start(
        interval: Duration,
        anchor: ProgressAnchor,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Option<Self> {
        if interval.is_zero() {
            tracing::debug!("Progress reporting disabled (zero interval)");
            return None;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No tokio runtime, progress reporting skipped");
            return None;
        };

        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                sink.emit(Notification::Progress {
                    elapsed: anchor.elapsed(clock.now()),
                    total: anchor.total,
                });
            }
        });

        Some(Self { handle })
    }
}

impl Drop for ProgressTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
