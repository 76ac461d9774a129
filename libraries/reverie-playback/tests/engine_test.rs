//! Integration tests for the playback engine
//!
//! Drives the engine through real transport sequences against mock storage,
//! a mock backend and a hand-moved clock.


use reverie_playback::{
    Notification, PlayStateStore, PlaybackConfig, PlaybackEngine, PlaybackError, PlaybackState,
    StateChange,
};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{harness, secs, track, tracks, MemoryStorage, MockBackend, RecordingSink, TokioClock};

fn library() -> MemoryStorage {
    MemoryStorage::default()
        .with_track("a", 10)
        .with_track("b", 20)
        .with_track("c", 30)
}

// ===== Transport =====

#[tokio::test]
async fn play_pause_resume_stop_workflow() {
    let mut h = harness(library());

    h.engine.play(Some(track("a"))).await.unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.current_track(), Some(&track("a")));
    assert_eq!(h.engine.duration(), Some(secs(10)));
    assert!(h.store.is_playing());

    h.clock.advance(secs(3));
    h.engine.pause();
    assert_eq!(h.engine.state(), PlaybackState::Paused);
    assert_eq!(h.engine.session().elapsed_offset, secs(3));
    assert!(h.backend.output(0).stopped);
    assert!(!h.store.is_playing());

    // Time spent paused does not count
    h.clock.advance(secs(10));
    assert_eq!(h.engine.position(), secs(3));

    h.engine.resume().unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.backend.output(1).starts, [secs(3)]);

    h.clock.advance(secs(2));
    assert_eq!(h.engine.position(), secs(5));

    h.engine.stop();
    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.engine.session().elapsed_offset, Duration::ZERO);
    assert!(h.backend.output(1).stopped);

    assert_eq!(
        h.sink.states(),
        [
            StateChange::Playing,
            StateChange::Paused,
            StateChange::Playing,
            StateChange::Stopped,
        ]
    );
    assert_eq!(h.backend.decode_count(), 1);
}

#[tokio::test]
async fn state_notifications_carry_the_track() {
    let mut h = harness(library());
    h.engine.play(Some(track("b"))).await.unwrap();

    let notifications = h.sink.all();
    assert!(matches!(
        notifications.as_slice(),
        [Notification::StateChanged { state: StateChange::Playing, track: Some(t) }] if *t == track("b")
    ));
    assert_eq!(notifications[0].topic(), "player.state.changed");
}

#[tokio::test]
async fn missing_file_leaves_state_untouched() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();

    let result = h.engine.play(Some(track("missing"))).await;

    assert!(matches!(result, Err(PlaybackError::FileNotFound(path)) if path.ends_with("missing.mp3")));
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.current_track(), Some(&track("a")));
    assert_eq!(h.backend.output_count(), 1);
    assert!(!h.backend.output(0).stopped);
    assert_eq!(h.sink.states(), [StateChange::Playing]);
}

#[tokio::test]
async fn decode_failure_leaves_state_untouched() {
    let mut h = harness(library().with_track("silent", 0));

    let result = h.engine.play(Some(track("silent"))).await;

    assert!(matches!(result, Err(PlaybackError::Decode(_))));
    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert!(h.engine.current_track().is_none());
    assert!(h.sink.all().is_empty());
}

#[tokio::test]
async fn output_failure_leaves_engine_stopped() {
    let mut h = harness(library());
    h.backend.fail_outputs();

    let result = h.engine.play(Some(track("a"))).await;

    assert!(matches!(result, Err(PlaybackError::AudioOutput(_))));
    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert!(!h.store.is_playing());
    assert!(h.sink.all().is_empty());
}

#[tokio::test]
async fn play_while_playing_replaces_silently() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.clock.advance(secs(4));

    h.engine.play(Some(track("b"))).await.unwrap();

    assert_eq!(h.engine.current_track(), Some(&track("b")));
    assert!(h.backend.output(0).stopped);
    assert_eq!(h.backend.output(1).starts, [Duration::ZERO]);
    assert_eq!(h.sink.states(), [StateChange::Playing, StateChange::Playing]);
    assert_eq!(
        h.store.lock().unwrap().last_played_track(),
        Some(&track("b"))
    );
}

#[tokio::test]
async fn play_without_track_reuses_cached_audio() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.engine.stop();

    h.engine.play(None).await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.backend.decode_count(), 1);
    assert_eq!(h.backend.output(1).starts, [Duration::ZERO]);
}

#[tokio::test]
async fn play_without_anything_loaded_is_a_no_op() {
    let mut h = harness(library());

    h.engine.play(None).await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.backend.output_count(), 0);
    assert!(h.sink.all().is_empty());
}

#[tokio::test]
async fn play_while_paused_resumes_and_ignores_track() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.clock.advance(secs(2));
    h.engine.pause();

    h.engine.play(Some(track("b"))).await.unwrap();

    assert_eq!(h.engine.current_track(), Some(&track("a")));
    assert_eq!(h.backend.output(1).starts, [secs(2)]);
    assert_eq!(h.backend.decode_count(), 1);
}

#[tokio::test]
async fn guarded_operations_are_no_ops() {
    let mut h = harness(library());

    h.engine.stop();
    h.engine.pause();
    h.engine.resume().unwrap();
    h.engine.seek(secs(1)).unwrap();
    h.engine.next().await.unwrap();
    h.engine.prev().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert!(h.sink.all().is_empty());

    // Stopped at the start of a loaded track: nothing to resume
    h.engine.play(Some(track("a"))).await.unwrap();
    h.engine.stop();
    h.engine.resume().unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Stopped);

    // Pausing twice reports once
    h.engine.play(None).await.unwrap();
    h.engine.pause();
    h.engine.pause();
    assert_eq!(
        h.sink.states(),
        [
            StateChange::Playing,
            StateChange::Stopped,
            StateChange::Playing,
            StateChange::Paused,
        ]
    );
}

// ===== Seeking =====

#[tokio::test]
async fn seek_while_playing_restarts_same_buffer() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.clock.advance(secs(1));

    h.engine.seek(secs(6)).unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.backend.decode_count(), 1);
    assert!(h.backend.output(0).stopped);
    assert_eq!(h.backend.output(1).starts, [secs(6)]);
    assert_eq!(h.engine.position(), secs(6));

    h.clock.advance(secs(1));
    assert_eq!(h.engine.position(), secs(7));
    assert_eq!(h.sink.states(), [StateChange::Playing, StateChange::Playing]);
}

#[tokio::test]
async fn seek_outside_track_is_ignored() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();

    h.engine.seek(Duration::ZERO).unwrap();
    h.engine.seek(secs(11)).unwrap();

    assert_eq!(h.backend.output_count(), 1);
    assert_eq!(h.engine.session().elapsed_offset, Duration::ZERO);

    // The very end is a valid target
    h.engine.seek(secs(10)).unwrap();
    assert_eq!(h.backend.output(1).starts, [secs(10)]);
}

#[tokio::test]
async fn seek_while_paused_moves_resume_point() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.clock.advance(secs(2));
    h.engine.pause();

    h.engine.seek(secs(7)).unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Paused);
    assert_eq!(h.backend.output_count(), 1);

    h.engine.resume().unwrap();
    assert_eq!(h.backend.output(1).starts, [secs(7)]);
}

#[test]
fn resume_and_seek_outside_a_runtime_skip_progress() {
    let mut h = harness(library());
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(h.engine.play(Some(track("c")))).unwrap();
    h.clock.advance(secs(2));
    h.engine.pause();
    drop(runtime);

    h.engine.resume().unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.backend.output(1).starts, [secs(2)]);

    h.engine.seek(secs(12)).unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.position(), secs(12));
    assert!(h.sink.progress().is_empty());
}

#[tokio::test]
async fn seek_while_stopped_allows_resume() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.engine.stop();

    h.engine.seek(secs(4)).unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Stopped);

    h.engine.resume().unwrap();
    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.backend.output(1).starts, [secs(4)]);
}

#[tokio::test]
async fn interleaved_seek_pause_resume_keeps_position() {
    let mut h = harness(library().with_track("long", 20));
    h.engine.play(Some(track("long"))).await.unwrap();

    h.clock.advance(secs(2));
    h.engine.seek(secs(5)).unwrap();
    h.clock.advance(secs(3));
    h.engine.pause();
    assert_eq!(h.engine.session().elapsed_offset, secs(8));

    h.engine.seek(secs(12)).unwrap();
    h.engine.resume().unwrap();
    h.clock.advance(secs(1));
    h.engine.seek(secs(15)).unwrap();
    h.clock.advance(secs(2));
    assert_eq!(h.engine.position(), secs(17));

    h.engine.pause();
    assert_eq!(h.engine.session().elapsed_offset, secs(17));

    // One decode, four outputs, every earlier output torn down
    assert_eq!(h.backend.decode_count(), 1);
    assert_eq!(h.backend.output_count(), 4);
    let starts: Vec<_> = (0..4).map(|i| h.backend.output(i).starts[0]).collect();
    assert_eq!(starts, [Duration::ZERO, secs(5), secs(12), secs(15)]);
    assert!((0..4).all(|i| h.backend.output(i).stopped));

    assert_eq!(
        h.sink.states(),
        [
            StateChange::Playing,
            StateChange::Playing,
            StateChange::Paused,
            StateChange::Playing,
            StateChange::Playing,
            StateChange::Paused,
        ]
    );
}

// ===== Completion =====

#[tokio::test]
async fn natural_end_without_playlist_stops() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.clock.advance(secs(10));

    h.backend.finish_current();
    assert!(h.engine.process_ended_signals().await.unwrap());

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.engine.session().elapsed_offset, Duration::ZERO);
    assert_eq!(h.engine.current_track(), Some(&track("a")));
    assert!(!h.store.is_playing());
    assert_eq!(h.sink.states(), [StateChange::Playing, StateChange::Ended]);
}

#[tokio::test]
async fn stale_end_signal_is_ignored() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.engine.play(Some(track("b"))).await.unwrap();

    // The replaced output reports late
    h.backend.finish_output(0);
    assert!(!h.engine.process_ended_signals().await.unwrap());

    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.current_track(), Some(&track("b")));
}

#[tokio::test]
async fn end_signal_after_pause_is_ignored() {
    let mut h = harness(library());
    h.engine.play(Some(track("a"))).await.unwrap();
    h.engine.pause();

    h.backend.finish_output(0);
    assert!(!h.engine.process_ended_signals().await.unwrap());
    assert_eq!(h.engine.state(), PlaybackState::Paused);
}

#[tokio::test]
async fn wait_for_end_handles_completion() {
    let mut h = harness(library());

    // Nothing playing: returns at once
    h.engine.wait_for_end().await.unwrap();

    h.engine.play(Some(track("a"))).await.unwrap();
    h.backend.finish_current();
    h.engine.wait_for_end().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.sink.states(), [StateChange::Playing, StateChange::Ended]);
}

// ===== Progress =====

#[tokio::test(start_paused = true)]
async fn progress_reported_while_playing_only() {
    let backend = Arc::new(MockBackend::default());
    let sink = Arc::new(RecordingSink::default());
    let mut engine = PlaybackEngine::new(Arc::new(library()), backend.clone(), sink.clone())
        .with_clock(Arc::new(TokioClock::new()));

    engine.play(Some(track("a"))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    engine.pause();
    tokio::time::sleep(secs(5)).await;

    assert_eq!(
        sink.progress(),
        [
            (Duration::from_millis(500), secs(10)),
            (Duration::from_millis(1_000), secs(10)),
        ]
    );

    // Resumed progress continues from the paused position
    engine.resume().unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    engine.stop();
    tokio::time::sleep(secs(5)).await;

    assert_eq!(sink.progress().last(), Some(&(Duration::from_millis(1_600), secs(10))));
    assert_eq!(sink.progress().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn progress_interval_is_configurable() {
    let backend = Arc::new(MockBackend::default());
    let sink = Arc::new(RecordingSink::default());
    let mut engine = PlaybackEngine::new(Arc::new(library()), backend.clone(), sink.clone())
        .with_clock(Arc::new(TokioClock::new()))
        .with_config(PlaybackConfig {
            progress_interval: secs(2),
        });

    engine.play(Some(track("c"))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    engine.stop();

    assert_eq!(
        sink.progress(),
        [(secs(2), secs(30)), (secs(4), secs(30))]
    );
}

// ===== Playlists =====

#[tokio::test]
async fn natural_end_advances_through_playlist() {
    let mut h = harness(library());
    h.engine
        .play_playlist(tracks(&["a", "b", "c"]), None)
        .await
        .unwrap();
    assert_eq!(h.engine.current_track(), Some(&track("a")));

    h.backend.finish_current();
    h.engine.process_ended_signals().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.current_track(), Some(&track("b")));
    assert_eq!(h.engine.playlist().and_then(|p| p.position()), Some(1));
    assert_eq!(
        h.sink.states(),
        [StateChange::Playing, StateChange::Ended, StateChange::Playing]
    );
}

#[tokio::test]
async fn natural_end_of_last_track_stops() {
    let mut h = harness(library());
    let all = tracks(&["a", "b", "c"]);
    h.engine
        .play_playlist(all.clone(), Some(&all[2]))
        .await
        .unwrap();

    h.backend.finish_current();
    h.engine.process_ended_signals().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.engine.playlist().and_then(|p| p.position()), Some(2));
    assert_eq!(h.sink.states(), [StateChange::Playing, StateChange::Ended]);
}

#[tokio::test]
async fn next_and_prev_stop_at_boundaries() {
    let mut h = harness(library());
    h.engine
        .play_playlist(tracks(&["a", "b"]), None)
        .await
        .unwrap();

    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.current_track(), Some(&track("a")));

    h.engine.next().await.unwrap();
    assert_eq!(h.engine.current_track(), Some(&track("b")));

    h.engine.next().await.unwrap();
    assert_eq!(h.engine.current_track(), Some(&track("b")));

    h.engine.prev().await.unwrap();
    assert_eq!(h.engine.current_track(), Some(&track("a")));

    assert_eq!(h.backend.decode_count(), 3);
}

#[tokio::test]
async fn skipping_while_paused_plays_the_neighbour() {
    let mut h = harness(library());
    h.engine
        .play_playlist(tracks(&["a", "b"]), None)
        .await
        .unwrap();
    h.clock.advance(secs(3));
    h.engine.pause();

    h.engine.next().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Playing);
    assert_eq!(h.engine.current_track(), Some(&track("b")));
    assert_eq!(h.backend.output(1).starts, [Duration::ZERO]);
}

#[tokio::test]
async fn failed_skip_keeps_cursor() {
    let mut h = harness(library());
    h.engine
        .play_playlist(tracks(&["a", "missing", "c"]), None)
        .await
        .unwrap();

    let result = h.engine.next().await;

    assert!(matches!(result, Err(PlaybackError::FileNotFound(_))));
    assert_eq!(h.engine.playlist().and_then(|p| p.position()), Some(0));
    assert_eq!(h.engine.current_track(), Some(&track("a")));
    assert_eq!(h.engine.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn playlist_start_must_be_a_member() {
    let mut h = harness(library());

    let result = h
        .engine
        .play_playlist(tracks(&["a", "b"]), Some(&track("c")))
        .await;

    assert!(matches!(result, Err(PlaybackError::NotFound(_))));
    assert!(h.engine.playlist().is_none());
    assert_eq!(h.engine.state(), PlaybackState::Stopped);
}

#[tokio::test]
async fn empty_playlist_is_a_no_op() {
    let mut h = harness(library());

    h.engine.play_playlist(tracks(&[]), None).await.unwrap();

    assert!(h.engine.playlist().is_none());
    assert!(h.sink.all().is_empty());
}

#[tokio::test]
async fn clearing_playlist_stops_auto_advance() {
    let mut h = harness(library());
    h.engine
        .play_playlist(tracks(&["a", "b"]), None)
        .await
        .unwrap();

    h.engine.clear_playlist();
    h.backend.finish_current();
    h.engine.process_ended_signals().await.unwrap();

    assert_eq!(h.engine.state(), PlaybackState::Stopped);
    assert_eq!(h.engine.current_track(), Some(&track("a")));
}
