use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::{TempDir, tempdir};

use super::testing::{FakeEngine, FakeService, RecordingReaper};
use super::*;
use crate::audio::EngineEvent;
use crate::library::TrackId;

type Manager = SessionManager<FakeEngine, RecordingReaper>;

fn manager(dir: &TempDir, service: &FakeService) -> Manager {
    let mut m = SessionManager::new(
        FakeEngine::with_duration(100),
        RecordingReaper::default(),
        dir.path(),
    );
    m.set_catalog(service.ids());
    m
}

fn drive(m: &mut Manager, service: &FakeService, request: Option<LoadRequest>) {
    if let Some(request) = request {
        let outcome = request.run(service);
        m.finish_load(outcome);
    }
}

fn select(m: &mut Manager, service: &FakeService, id: &str) {
    let request = m.select_track(TrackId::from(id));
    drive(m, service, Some(request));
}

fn files_in(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn next_walks_the_catalog_then_goes_idle() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);

    select(&mut m, &service, "a.mp3");
    assert_eq!(m.state(), SessionState::Playing);
    assert_eq!(m.live_track().map(TrackId::as_str), Some("a.mp3"));
    assert!(m.live_resource().unwrap().exists());

    let request = m.next();
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3"]);
    drive(&mut m, &service, request);
    assert_eq!(m.state(), SessionState::Playing);
    assert_eq!(m.live_track().map(TrackId::as_str), Some("b.mp3"));

    assert!(m.next().is_none());
    assert_eq!(m.state(), SessionState::Idle);
    assert!(m.live_track().is_none());
    assert!(m.live_resource().is_none());
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3", "b.mp3"]);
}

#[test]
fn missing_track_errors_without_materializing() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);

    select(&mut m, &service, "missing.mp3");
    assert_eq!(m.state(), SessionState::Errored);
    assert!(m.live_resource().is_none());
    assert_eq!(files_in(dir.path()), 0);
    assert_eq!(m.engine().count("load"), 0);

    let notices = m.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to play the selected track.");

    select(&mut m, &service, "a.mp3");
    assert_eq!(m.state(), SessionState::Playing);
}

#[test]
fn unreachable_service_is_reported_as_connection_failure() {
    let dir = tempdir().unwrap();
    let mut service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    service.unavailable = true;

    select(&mut m, &service, "a.mp3");
    assert_eq!(m.state(), SessionState::Errored);
    assert_eq!(
        m.take_notices()[0].message,
        "Failed to connect to the music service."
    );
}

#[test]
fn unreadable_track_is_reported_like_a_missing_one() {
    let dir = tempdir().unwrap();
    let mut service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    service.unreadable = true;

    select(&mut m, &service, "a.mp3");
    assert_eq!(m.state(), SessionState::Errored);
    assert!(m.live_resource().is_none());
    assert_eq!(files_in(dir.path()), 0);
    assert_eq!(m.engine().count("load"), 0);

    let notices = m.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to play the selected track.");
}

#[test]
fn sequential_selection_never_owns_more_than_one_resource() {
    let dir = tempdir().unwrap();
    let names = ["a.mp3", "b.mp3", "c.mp3", "b.mp3", "a.mp3"];
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3", "c.mp3"]);
    let mut m = manager(&dir, &service);

    for (i, name) in names.iter().enumerate() {
        select(&mut m, &service, name);

        let live = m.live_resource().unwrap().to_path_buf();
        let reaped = m.reaper().reaped.borrow();
        assert_eq!(reaped.len(), i);
        assert!(reaped.iter().all(|r| r.path() != live));
        // The recording reaper keeps files on disk: one per selection.
        assert_eq!(files_in(dir.path()), i + 1);
    }

    let reaped = m.reaper().reaped.borrow();
    let mut paths: Vec<_> = reaped.iter().map(|r| r.path().to_path_buf()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), names.len() - 1);
}

#[test]
fn teardown_is_idempotent() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");

    m.teardown();
    let after_once = (m.state(), m.progress(), m.reaper().reaped_tracks());
    m.teardown();
    let after_twice = (m.state(), m.progress(), m.reaper().reaped_tracks());

    assert_eq!(after_once, after_twice);
    assert_eq!(after_twice.0, SessionState::Idle);
    assert_eq!(m.engine().count("unload"), 1);
    assert_eq!(m.progress().elapsed, 0.0);
}

#[test]
fn teardown_from_idle_is_safe() {
    let dir = tempdir().unwrap();
    let service = FakeService::default();
    let mut m = manager(&dir, &service);
    m.teardown();
    assert_eq!(m.state(), SessionState::Idle);
    assert!(m.reaper().reaped_tracks().is_empty());
}

#[test]
fn previous_at_first_entry_restarts_the_track() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");
    m.handle_engine_event(EngineEvent::PositionUpdated(42.0));
    assert_eq!(m.progress().elapsed, 42.0);

    let request = m.previous().unwrap();
    assert_eq!(request.id.as_str(), "a.mp3");
    drive(&mut m, &service, Some(request));

    assert_eq!(m.state(), SessionState::Playing);
    assert_eq!(m.live_track().map(TrackId::as_str), Some("a.mp3"));
    assert_eq!(m.progress().elapsed, 0.0);
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3"]);
}

#[test]
fn previous_moves_to_the_prior_entry() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "b.mp3");

    let request = m.previous();
    drive(&mut m, &service, request);
    assert_eq!(m.live_track().map(TrackId::as_str), Some("a.mp3"));
}

#[test]
fn toggle_without_session_starts_first_track() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);

    let request = m.toggle_play_pause().unwrap();
    assert_eq!(request.id.as_str(), "a.mp3");
    // A second toggle while loading does not start another fetch.
    assert!(m.toggle_play_pause().is_none());
    drive(&mut m, &service, Some(request));
    assert_eq!(m.state(), SessionState::Playing);
}

#[test]
fn toggle_with_empty_catalog_is_a_no_op() {
    let dir = tempdir().unwrap();
    let service = FakeService::default();
    let mut m = manager(&dir, &service);
    assert!(m.toggle_play_pause().is_none());
    assert_eq!(m.state(), SessionState::Idle);
}

#[test]
fn toggle_pauses_and_resumes() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");

    assert!(m.toggle_play_pause().is_none());
    assert_eq!(m.state(), SessionState::Paused);
    assert!(m.toggle_play_pause().is_none());
    assert_eq!(m.state(), SessionState::Playing);
    assert_eq!(m.engine().count("pause"), 1);
    assert_eq!(m.engine().count("play"), 2);
}

#[test]
fn stop_rewinds_and_toggle_restarts() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");
    m.handle_engine_event(EngineEvent::PositionUpdated(12.0));

    m.stop();
    assert_eq!(m.state(), SessionState::Stopped);
    assert_eq!(m.progress().elapsed, 0.0);
    assert!(m.live_resource().is_some());

    m.toggle_play_pause();
    assert_eq!(m.state(), SessionState::Playing);
}

#[test]
fn seek_is_clamped_and_keeps_play_state() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);

    m.seek(10.0);
    assert!(m.engine().seeks().is_empty());

    select(&mut m, &service, "a.mp3");
    m.toggle_play_pause();
    m.seek(500.0);
    m.seek(-3.0);
    m.seek(30.0);

    assert_eq!(m.engine().seeks(), vec!["seek 100", "seek 0", "seek 30"]);
    assert_eq!(m.state(), SessionState::Paused);
    assert_eq!(m.progress().elapsed, 30.0);
}

#[test]
fn drag_suppresses_progress_and_commits_one_seek() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");
    m.handle_engine_event(EngineEvent::PositionUpdated(5.0));

    m.begin_seek_drag();
    m.drag_seek_to(40.0);
    m.handle_engine_event(EngineEvent::PositionUpdated(6.0));
    m.drag_seek_to(60.0);

    let shown = m.progress();
    assert!(shown.dragging);
    assert_eq!(shown.elapsed, 60.0);
    assert!(m.engine().seeks().is_empty());

    m.end_seek_drag();
    m.end_seek_drag();
    assert_eq!(m.engine().seeks(), vec!["seek 60"]);
    assert_eq!(m.progress().elapsed, 60.0);
    assert!(!m.progress().dragging);
}

#[test]
fn progress_never_moves_backwards_within_a_seek_epoch() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");

    m.handle_engine_event(EngineEvent::PositionUpdated(1.0));
    m.handle_engine_event(EngineEvent::PositionUpdated(2.0));
    m.handle_engine_event(EngineEvent::PositionUpdated(1.5));
    assert_eq!(m.progress().elapsed, 2.0);

    // An explicit seek backwards starts a new epoch.
    m.seek(0.5);
    m.handle_engine_event(EngineEvent::PositionUpdated(0.7));
    assert_eq!(m.progress().elapsed, 0.7);
}

#[test]
fn end_of_media_advances_then_stops_at_the_end() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");

    m.engine_mut().events.push(EngineEvent::EndOfMedia);
    let requests = m.pump_engine();
    assert_eq!(requests.len(), 1);
    assert!(!m.reached_end());
    drive(&mut m, &service, requests.into_iter().next());
    assert_eq!(m.live_track().map(TrackId::as_str), Some("b.mp3"));

    assert!(m.handle_engine_event(EngineEvent::EndOfMedia).is_none());
    assert!(m.reached_end());
    assert_eq!(m.state(), SessionState::Idle);
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3", "b.mp3"]);
}

#[test]
fn engine_error_tears_down_and_alerts() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = manager(&dir, &service);
    select(&mut m, &service, "a.mp3");

    m.handle_engine_event(EngineEvent::Error("decoder crashed".into()));
    assert_eq!(m.state(), SessionState::Errored);
    assert!(m.live_resource().is_none());
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3"]);
    assert_eq!(m.take_notices()[0].title, "Playback Error");
}

#[test]
fn rejected_resource_goes_straight_to_the_reaper() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = SessionManager::new(
        FakeEngine {
            reject_loads: true,
            ..FakeEngine::default()
        },
        RecordingReaper::default(),
        dir.path(),
    );
    m.set_catalog(service.ids());

    let request = m.select_track(TrackId::from("a.mp3"));
    m.finish_load(request.run(&service));

    assert_eq!(m.state(), SessionState::Errored);
    assert!(m.live_resource().is_none());
    assert_eq!(m.reaper().reaped_tracks(), vec!["a.mp3"]);
    assert_eq!(m.take_notices()[0].message, "Cannot play the selected track.");
}

#[test]
fn superseded_loads_are_discarded() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let mut m = manager(&dir, &service);

    let first = m.select_track(TrackId::from("a.mp3"));
    let second = m.select_track(TrackId::from("b.mp3"));

    m.finish_load(first.run(&service));
    assert_eq!(m.state(), SessionState::Loading);
    assert_eq!(files_in(dir.path()), 0);

    m.finish_load(second.run(&service));
    assert_eq!(m.state(), SessionState::Playing);
    assert_eq!(m.live_track().map(TrackId::as_str), Some("b.mp3"));
    assert_eq!(files_in(dir.path()), 1);
}

#[test]
fn engine_duration_falls_back_to_metadata() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3"]);
    let mut m = SessionManager::new(
        FakeEngine::default(),
        RecordingReaper::default(),
        dir.path(),
    );
    m.set_catalog(service.ids());
    select(&mut m, &service, "a.mp3");
    assert_eq!(m.progress().duration, Some(180.0));
}

#[test]
fn real_reaper_deletes_replaced_resources() {
    let dir = tempdir().unwrap();
    let service = FakeService::with_tracks(&["a.mp3", "b.mp3"]);
    let reaper = Reaper::with_parts(
        ReapPolicy {
            quiescence: Duration::from_millis(20),
            attempts: 3,
            backoff: Duration::from_millis(10),
        },
        FsRemover,
        ThreadSleeper,
    );
    let mut m = SessionManager::new(FakeEngine::with_duration(100), reaper, dir.path());
    m.set_catalog(service.ids());

    let request = m.select_track(TrackId::from("a.mp3"));
    m.finish_load(request.run(&service));
    let first = m.live_resource().unwrap().to_path_buf();

    let request = m.next().unwrap();
    m.finish_load(request.run(&service));
    let second = m.live_resource().unwrap().to_path_buf();

    assert!(m.reaper().wait_idle(Duration::from_secs(2)));
    assert!(!first.exists());
    assert!(second.exists());

    m.teardown();
    assert!(m.reaper().wait_idle(Duration::from_secs(2)));
    assert!(!second.exists());
}
