//! Playback engine - core orchestration
//!
//! Owns the single playback session: loads and decodes tracks through the
//! storage and backend traits, drives one audio output at a time, keeps the
//! playlist cursor, and reports state changes and progress to the sink.

use crate::{
    backend::{AudioBackend, AudioBuffer, AudioOutput, Clock, EndedSignal, SystemClock},
    error::{PlaybackError, Result},
    events::{Notification, NotificationSink, StateChange},
    playlist::PlaylistCursor,
    progress::{ProgressAnchor, ProgressTimer},
    state_store::{InMemoryPlayState, PlayStateStore},
    storage::Storage,
    types::{PlaybackConfig, PlaybackSession, PlaybackState},
};
use reverie_metadata::Track;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How the live output is being torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HaltMode {
    /// Back to the start of the track
    Stop,

    /// Remember the position for resume
    Pause,

    /// Restart elsewhere in the same buffer; state is left alone
    Seek,

    /// Another track (or a restart) takes over; nothing is reported
    Replace,
}

/// Playback engine
///
/// Engine methods take `&mut self`; a host that shares the engine wraps it
/// in a lock, so control calls never overlap. All file access and decoding
/// finish before any state is touched, so a failed `play` leaves the session
/// as it was.
///
/// Natural end of a track is reported by the output through an
/// [`EndedSignal`]. The host drives completion handling by awaiting
/// [`wait_for_end`](Self::wait_for_end) or polling
/// [`process_ended_signals`](Self::process_ended_signals).
///
/// # Runtime
///
/// The engine must be used from within a tokio runtime. Entering `Playing`
/// (through `play`, `resume`, `seek` or a playlist step) spawns the progress
/// task on the current runtime, and the synchronous `resume` and `seek` are
/// no exception. Outside a runtime no progress is reported; audio backends
/// may have stricter needs of their own.
pub struct PlaybackEngine {
    storage: Arc<dyn Storage>,
    backend: Arc<dyn AudioBackend>,
    clock: Arc<dyn Clock>,
    store: Box<dyn PlayStateStore>,
    sink: Arc<dyn NotificationSink>,
    config: PlaybackConfig,

    session: PlaybackSession,
    output: Option<Box<dyn AudioOutput>>,
    playlist: Option<PlaylistCursor>,
    progress: Option<ProgressTimer>,

    // Output generation; bumped for every output created
    generation: u64,
    ended_tx: mpsc::UnboundedSender<u64>,
    ended_rx: mpsc::UnboundedReceiver<u64>,
}

impl PlaybackEngine {
    /// Create an engine with the system clock, in-memory play state and
    /// default configuration
    pub fn new(
        storage: Arc<dyn Storage>,
        backend: Arc<dyn AudioBackend>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let (ended_tx, ended_rx) = mpsc::unbounded_channel();

        Self {
            storage,
            backend,
            clock: Arc::new(SystemClock::new()),
            store: Box::new(InMemoryPlayState::new()),
            sink,
            config: PlaybackConfig::default(),
            session: PlaybackSession::default(),
            output: None,
            playlist: None,
            progress: None,
            generation: 0,
            ended_tx,
            ended_rx,
        }
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a host-provided play-state store
    pub fn with_state_store(mut self, store: Box<dyn PlayStateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    // ===== Transport =====

    /// Start playback
    ///
    /// - While paused, resumes the paused track; `track` is ignored.
    /// - With a track, reads and decodes it, then replaces whatever is
    ///   playing without reporting `stopped`.
    /// - Without a track, restarts the loaded track from the stored offset
    ///   using the cached audio. Does nothing if no track was ever loaded.
    ///
    /// # Errors
    /// `FileNotFound`, `Io` or `Decode` when the track cannot be loaded, in
    /// which case nothing changes. `AudioOutput` when the output cannot be
    /// started.
    pub async fn play(&mut self, track: Option<Track>) -> Result<()> {
        if self.session.state == PlaybackState::Paused {
            tracing::debug!("Play while paused, resuming");
            return self.resume();
        }

        match track {
            Some(track) => self.switch_to(track).await,
            None if self.session.decoded_audio.is_some() => self.begin(None, false),
            None => {
                tracing::debug!("Play ignored: no track loaded");
                Ok(())
            }
        }
    }

    /// Stop playback and rewind to the start
    ///
    /// Does nothing unless playing.
    pub fn stop(&mut self) {
        if self.session.state != PlaybackState::Playing {
            tracing::debug!("Stop ignored: not playing");
            return;
        }

        self.halt(HaltMode::Stop);
        self.store.set_playing(false);
        self.emit_state(StateChange::Stopped);
    }

    /// Pause playback, remembering the position
    ///
    /// Does nothing unless playing.
    pub fn pause(&mut self) {
        if self.session.state != PlaybackState::Playing {
            tracing::debug!("Pause ignored: not playing");
            return;
        }

        self.halt(HaltMode::Pause);
        self.store.set_playing(false);
        self.emit_state(StateChange::Paused);
    }

    /// Continue from the stored offset
    ///
    /// Does nothing without loaded audio, while playing, or when stopped at
    /// the start of the track.
    pub fn resume(&mut self) -> Result<()> {
        let state = self.session.state;
        if self.session.decoded_audio.is_none()
            || state == PlaybackState::Playing
            || (state == PlaybackState::Stopped && self.session.elapsed_offset.is_zero())
        {
            tracing::debug!("Resume ignored in state {:?}", state);
            return Ok(());
        }

        self.start_output()?;
        self.store.set_playing(true);
        self.emit_state(StateChange::Playing);
        Ok(())
    }

    /// Move the playback position to `target`
    ///
    /// While playing, restarts the cached audio at `target` without decoding
    /// again. Otherwise only the stored offset moves. Does nothing for a zero
    /// target, a target past the end, or when nothing is loaded.
    pub fn seek(&mut self, target: Duration) -> Result<()> {
        let Some(total) = self.session.total() else {
            tracing::debug!("Seek ignored: no track loaded");
            return Ok(());
        };
        if target.is_zero() || target > total {
            tracing::debug!("Seek ignored: {:?} outside (0, {:?}]", target, total);
            return Ok(());
        }

        if self.session.state == PlaybackState::Playing {
            self.halt(HaltMode::Seek);
            self.session.elapsed_offset = target;
            self.begin(None, true)
        } else {
            self.session.elapsed_offset = target;
            Ok(())
        }
    }

    // ===== Playlist =====

    /// Play `tracks` as the active playlist, from `start` or from the head
    ///
    /// An empty playlist does nothing. The playlist becomes active only once
    /// its first track has started.
    ///
    /// # Errors
    /// `NotFound` when `start` is not in `tracks`, plus the errors of
    /// [`play`](Self::play).
    pub async fn play_playlist(
        &mut self,
        tracks: impl Into<Arc<[Track]>>,
        start: Option<&Track>,
    ) -> Result<()> {
        let mut cursor = match start {
            Some(start) => PlaylistCursor::starting_at(tracks, start)?,
            None => PlaylistCursor::new(tracks),
        };

        let Some(track) = cursor.current_track().cloned() else {
            tracing::debug!("Play playlist ignored: playlist is empty");
            return Ok(());
        };

        self.switch_to(track).await?;
        self.playlist = Some(cursor);
        Ok(())
    }

    /// Forget the active playlist; the current track keeps playing
    pub fn clear_playlist(&mut self) {
        self.playlist = None;
    }

    /// Play the next playlist track
    ///
    /// Does nothing without a playlist or at its last track.
    pub async fn next(&mut self) -> Result<()> {
        self.step(true).await
    }

    /// Play the previous playlist track
    ///
    /// Does nothing without a playlist or at its first track.
    pub async fn prev(&mut self) -> Result<()> {
        self.step(false).await
    }

    async fn step(&mut self, forward: bool) -> Result<()> {
        let Some(cursor) = self.playlist.as_mut() else {
            tracing::debug!("Skip ignored: no playlist");
            return Ok(());
        };

        let previous = cursor.position();
        let neighbour = if forward {
            cursor.advance()
        } else {
            cursor.retreat()
        };
        let Some(track) = neighbour.cloned() else {
            tracing::debug!("Skip ignored: at playlist boundary");
            return Ok(());
        };

        let result = self.switch_to(track).await;
        if result.is_err() {
            if let Some(cursor) = self.playlist.as_mut() {
                cursor.restore(previous);
            }
        }
        result
    }

    // ===== Completion =====

    /// Handle every end-of-track report received so far
    ///
    /// Returns `true` if the current track had ended. Reports from outputs
    /// that were already torn down are dropped.
    pub async fn process_ended_signals(&mut self) -> Result<bool> {
        let mut ended = false;
        while let Ok(generation) = self.ended_rx.try_recv() {
            if self.is_live(generation) {
                self.on_playback_ended().await?;
                ended = true;
            }
        }
        Ok(ended)
    }

    /// Wait until the current output plays to its end, then handle it
    ///
    /// Returns immediately when nothing is playing.
    pub async fn wait_for_end(&mut self) -> Result<()> {
        while self.output.is_some() {
            let Some(generation) = self.ended_rx.recv().await else {
                break;
            };
            if self.is_live(generation) {
                return self.on_playback_ended().await;
            }
        }
        Ok(())
    }

    fn is_live(&self, generation: u64) -> bool {
        let live = self.output.is_some() && generation == self.generation;
        if !live {
            tracing::trace!("Dropping stale end signal from output {}", generation);
        }
        live
    }

    async fn on_playback_ended(&mut self) -> Result<()> {
        self.progress = None;
        self.output = None;
        self.session.state = PlaybackState::Stopped;
        self.session.elapsed_offset = Duration::ZERO;
        self.session.started_at = None;
        self.store.set_playing(false);
        self.emit_state(StateChange::Ended);

        if self.playlist.as_ref().is_some_and(|p| !p.is_at_last()) {
            self.next().await?;
        }
        Ok(())
    }

    // ===== Accessors =====

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Track whose audio is loaded
    pub fn current_track(&self) -> Option<&Track> {
        self.session.active_track.as_ref()
    }

    pub fn playlist(&self) -> Option<&PlaylistCursor> {
        self.playlist.as_ref()
    }

    /// Current playback position
    pub fn position(&self) -> Duration {
        self.session.elapsed_at(self.clock.now())
    }

    /// Duration of the loaded track
    pub fn duration(&self) -> Option<Duration> {
        self.session.total()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Internals =====

    /// Load `track` and make it the playing track
    async fn switch_to(&mut self, track: Track) -> Result<()> {
        let buffer = load_track(self.storage.as_ref(), self.backend.as_ref(), &track).await?;
        self.begin(Some((track, buffer)), false)
    }

    /// Start an output for `loaded`, or for the cached audio when `None`
    fn begin(&mut self, loaded: Option<(Track, Arc<AudioBuffer>)>, seeking: bool) -> Result<()> {
        if self.session.state != PlaybackState::Stopped && !seeking {
            self.halt(HaltMode::Replace);
        }

        if let Some((track, buffer)) = loaded {
            self.session.active_track = Some(track);
            self.session.decoded_audio = Some(buffer);
        }

        self.start_output()?;

        if let Some(track) = &self.session.active_track {
            tracing::info!(
                "Playing {} from {:?}",
                track.display_title(),
                self.session.elapsed_offset
            );
            self.store.set_last_played_track(track.clone());
        }
        self.store.set_playing(true);
        self.emit_state(StateChange::Playing);
        Ok(())
    }

    /// Create a fresh output for the cached audio and start it at the stored
    /// offset
    ///
    /// On failure the session is left stopped with its offset intact.
    fn start_output(&mut self) -> Result<()> {
        let Some(buffer) = self.session.decoded_audio.clone() else {
            return Ok(());
        };

        self.generation += 1;
        let ended = EndedSignal::new(self.generation, self.ended_tx.clone());
        let offset = self.session.elapsed_offset;

        let started = self
            .backend
            .create_output(Arc::clone(&buffer), ended)
            .and_then(|mut output| output.start(offset).map(|()| output));

        let output = match started {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to start audio output: {}", e);
                self.session.state = PlaybackState::Stopped;
                self.session.started_at = None;
                self.store.set_playing(false);
                return Err(e);
            }
        };

        let now = self.clock.now();
        self.output = Some(output);
        self.session.started_at = Some(now);
        self.session.state = PlaybackState::Playing;
        self.progress = ProgressTimer::start(
            self.config.progress_interval,
            ProgressAnchor {
                offset,
                started_at: now,
                total: buffer.duration(),
            },
            Arc::clone(&self.clock),
            Arc::clone(&self.sink),
        );
        Ok(())
    }

    /// Tear down the live output and progress timer
    fn halt(&mut self, mode: HaltMode) {
        self.progress = None;
        if let Some(mut output) = self.output.take() {
            output.stop();
        }

        match mode {
            HaltMode::Stop | HaltMode::Replace => {
                self.session.state = PlaybackState::Stopped;
                self.session.elapsed_offset = Duration::ZERO;
            }
            HaltMode::Pause => {
                let now = self.clock.now();
                let running = self
                    .session
                    .started_at
                    .map_or(Duration::ZERO, |started_at| now.saturating_sub(started_at));
                self.session.elapsed_offset += running;
                self.session.state = PlaybackState::Paused;
            }
            HaltMode::Seek => {}
        }
        self.session.started_at = None;
    }

    fn emit_state(&self, state: StateChange) {
        self.sink.emit(Notification::StateChanged {
            state,
            track: self.session.active_track.clone(),
        });
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.stop();
        }
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("session", &self.session)
            .field("playlist", &self.playlist)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Check, read and decode a track's audio
async fn load_track(
    storage: &dyn Storage,
    backend: &dyn AudioBackend,
    track: &Track,
) -> Result<Arc<AudioBuffer>> {
    let path = track.path();
    if !storage.exists(path).await {
        return Err(PlaybackError::FileNotFound(path.to_path_buf()));
    }

    let bytes = storage.read_bytes(path).await?;
    let buffer = backend.decode(bytes).await?;
    Ok(Arc::new(buffer))
}
