use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::{EngineEvent, PlaybackEngine};
use crate::delivery::{DeliveryError, DeliveryService};
use crate::library::{TrackBlob, TrackId, TrackMetadata};

use super::reaper::Reap;
use super::resource::{MaterializedResource, materialize};
use super::state::{Notice, Progress, SessionState};

pub(crate) const PLAY_FAILED: &str = "Failed to play the selected track.";
const ENGINE_FAILED: &str = "Cannot play the selected track.";
pub(crate) const CONNECT_FAILED: &str = "Failed to connect to the music service.";

/// A fetch the runtime must perform off the control thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub id: TrackId,
}

impl LoadRequest {
    /// Fetch bytes and metadata as one unit.
    pub fn run(self, service: &dyn DeliveryService) -> LoadOutcome {
        let result = service.fetch_track(&self.id).and_then(|blob| {
            service
                .fetch_metadata(&self.id)
                .map(|metadata| FetchedTrack { blob, metadata })
        });
        LoadOutcome {
            generation: self.generation,
            id: self.id,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchedTrack {
    pub blob: TrackBlob,
    pub metadata: TrackMetadata,
}

/// Result of a `LoadRequest`, marshaled back to the control thread.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub id: TrackId,
    pub result: Result<FetchedTrack, DeliveryError>,
}

/// The live binding of one local resource to the engine.
#[derive(Debug)]
struct PlaybackSession {
    id: TrackId,
    resource: MaterializedResource,
    metadata: TrackMetadata,
    duration: f64,
}

/// Owns the "current track" and every transition around it.
///
/// All methods run on the control thread. Remote work is handed out as
/// `LoadRequest`s and comes back through `finish_load`.
pub struct SessionManager<E: PlaybackEngine, R: Reap> {
    engine: E,
    reaper: R,
    temp_dir: PathBuf,
    catalog: Vec<TrackId>,
    state: SessionState,
    live: Option<PlaybackSession>,
    pending: Option<LoadRequest>,
    generation: u64,
    current: Option<TrackId>,
    reached_end: bool,
    elapsed: f64,
    drag: Option<f64>,
    notices: VecDeque<Notice>,
}

impl<E: PlaybackEngine, R: Reap> SessionManager<E, R> {
    pub fn new(engine: E, reaper: R, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            reaper,
            temp_dir: temp_dir.into(),
            catalog: Vec::new(),
            state: SessionState::Idle,
            live: None,
            pending: None,
            generation: 0,
            current: None,
            reached_end: false,
            elapsed: 0.0,
            drag: None,
            notices: VecDeque::new(),
        }
    }

    pub fn set_catalog(&mut self, catalog: Vec<TrackId>) {
        self.catalog = catalog;
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &[TrackId] {
        &self.catalog
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn reaper(&self) -> &R {
        &self.reaper
    }

    /// Track that was last selected, live or not.
    pub fn current_track(&self) -> Option<&TrackId> {
        self.current.as_ref()
    }

    pub fn live_track(&self) -> Option<&TrackId> {
        self.live.as_ref().map(|s| &s.id)
    }

    pub fn live_metadata(&self) -> Option<&TrackMetadata> {
        self.live.as_ref().map(|s| &s.metadata)
    }

    pub fn live_resource(&self) -> Option<&Path> {
        self.live.as_ref().map(|s| s.resource.path())
    }

    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn progress(&self) -> Progress {
        Progress {
            elapsed: self.drag.unwrap_or(self.elapsed),
            duration: self.live.as_ref().map(|s| s.duration),
            dragging: self.drag.is_some(),
        }
    }

    /// Alerts raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, title: &str, message: &str) {
        tracing::warn!(title, message, "user notice");
        self.notices.push_back(Notice::new(title, message));
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    fn index_of_current(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.catalog.iter().position(|t| t == current)
    }

    /// Make `id` the current track. Any live session is torn down first;
    /// the returned request must be run and fed back to `finish_load`.
    pub fn select_track(&mut self, id: TrackId) -> LoadRequest {
        self.teardown();

        self.generation += 1;
        let request = LoadRequest {
            generation: self.generation,
            id: id.clone(),
        };
        tracing::debug!(track = %id, generation = self.generation, "selecting track");

        self.current = Some(id);
        self.reached_end = false;
        self.pending = Some(request.clone());
        self.set_state(SessionState::Loading);
        request
    }

    /// Apply a fetch result. Outcomes of superseded requests are dropped.
    pub fn finish_load(&mut self, outcome: LoadOutcome) {
        match &self.pending {
            Some(pending) if pending.generation == outcome.generation => {}
            _ => {
                tracing::debug!(
                    track = %outcome.id,
                    generation = outcome.generation,
                    "discarding superseded load"
                );
                return;
            }
        }
        self.pending = None;

        let fetched = match outcome.result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(track = %outcome.id, error = %e, "fetching track failed");
                let message = if e.is_transport() {
                    CONNECT_FAILED
                } else {
                    PLAY_FAILED
                };
                self.set_state(SessionState::Errored);
                self.notify("Error", message);
                return;
            }
        };

        let resource = match materialize(&self.temp_dir, &outcome.id, &fetched.blob) {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(error = %e, "materializing track failed");
                self.set_state(SessionState::Errored);
                self.notify("Error", PLAY_FAILED);
                return;
            }
        };

        let duration = match self.engine.load(resource.path()) {
            Ok(duration) => duration,
            Err(e) => {
                tracing::warn!(track = %outcome.id, error = %e, "engine rejected track");
                self.reaper.reap(resource);
                self.set_state(SessionState::Errored);
                self.notify("Playback Error", ENGINE_FAILED);
                return;
            }
        };

        let duration = duration
            .map(|d| d.as_secs_f64())
            .filter(|d| *d > 0.0)
            .unwrap_or(fetched.metadata.duration_seconds() as f64);

        self.live = Some(PlaybackSession {
            id: outcome.id,
            resource,
            metadata: fetched.metadata,
            duration,
        });
        self.elapsed = 0.0;
        self.drag = None;
        self.set_state(SessionState::Ready);

        self.engine.play();
        self.set_state(SessionState::Playing);
    }

    /// Pause a playing track, resume anything else. Without a session this
    /// starts the first catalog entry.
    pub fn toggle_play_pause(&mut self) -> Option<LoadRequest> {
        if self.live.is_none() {
            if self.pending.is_some() {
                return None;
            }
            let first = self.catalog.first()?.clone();
            return Some(self.select_track(first));
        }

        match self.state {
            SessionState::Playing => {
                self.engine.pause();
                self.set_state(SessionState::Paused);
            }
            SessionState::Paused | SessionState::Stopped | SessionState::Ready => {
                self.engine.play();
                self.set_state(SessionState::Playing);
            }
            _ => {}
        }
        None
    }

    /// Halt and rewind the live track, keeping it bound.
    pub fn stop(&mut self) {
        if self.live.is_none() {
            return;
        }
        self.engine.stop();
        self.elapsed = 0.0;
        self.drag = None;
        self.set_state(SessionState::Stopped);
    }

    /// Jump to `seconds`, clamped to the track. Play/pause state is kept.
    pub fn seek(&mut self, seconds: f64) {
        let Some(session) = &self.live else {
            return;
        };
        let target = clamp_position(seconds, session.duration);
        match self.engine.seek(Duration::from_secs_f64(target)) {
            Ok(()) => self.elapsed = target,
            Err(e) => tracing::warn!(error = %e, "seek failed"),
        }
    }

    /// Start a seek drag; engine position events are ignored until it ends.
    pub fn begin_seek_drag(&mut self) {
        if self.live.is_some() && self.drag.is_none() {
            self.drag = Some(self.elapsed);
        }
    }

    pub fn drag_seek_to(&mut self, seconds: f64) {
        let Some(session) = &self.live else {
            return;
        };
        if self.drag.is_some() {
            self.drag = Some(clamp_position(seconds, session.duration));
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Finish the drag with exactly one seek to its last position.
    pub fn end_seek_drag(&mut self) {
        if let Some(target) = self.drag.take() {
            self.seek(target);
        }
    }

    /// Advance to the following catalog entry, or stop at the end.
    pub fn next(&mut self) -> Option<LoadRequest> {
        let next = match self.index_of_current() {
            Some(i) => self.catalog.get(i + 1).cloned(),
            None => self.catalog.first().cloned(),
        };
        match next {
            Some(id) => Some(self.select_track(id)),
            None => {
                tracing::debug!("end of playlist");
                self.teardown();
                None
            }
        }
    }

    /// Go to the prior catalog entry, or restart the first one.
    pub fn previous(&mut self) -> Option<LoadRequest> {
        let target = match self.index_of_current() {
            Some(0) => self.catalog.first().cloned(),
            Some(i) => self.catalog.get(i - 1).cloned(),
            None => self.catalog.first().cloned(),
        };
        target.map(|id| self.select_track(id))
    }

    pub fn on_end_of_media(&mut self) -> Option<LoadRequest> {
        self.reached_end = true;
        self.next()
    }

    pub fn on_engine_error(&mut self, message: &str) {
        tracing::warn!(error = message, "playback engine error");
        self.notify("Playback Error", ENGINE_FAILED);
        self.teardown();
        self.set_state(SessionState::Errored);
    }

    /// Route one engine event.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<LoadRequest> {
        match event {
            EngineEvent::PositionUpdated(seconds) => {
                if self.state == SessionState::Playing
                    && self.drag.is_none()
                    && seconds >= self.elapsed
                {
                    self.elapsed = seconds;
                }
                None
            }
            EngineEvent::Ready => {
                tracing::trace!("engine ready");
                None
            }
            EngineEvent::EndOfMedia => {
                if self.live.is_some() {
                    self.on_end_of_media()
                } else {
                    None
                }
            }
            EngineEvent::Error(message) => {
                if self.live.is_some() {
                    self.on_engine_error(&message);
                }
                None
            }
        }
    }

    /// Drain pending engine events; returns loads they triggered.
    pub fn pump_engine(&mut self) -> Vec<LoadRequest> {
        let events = self.engine.poll_events();
        events
            .into_iter()
            .filter_map(|event| self.handle_engine_event(event))
            .collect()
    }

    /// Release the engine and hand the resource to the reaper. Idempotent.
    pub fn teardown(&mut self) {
        self.pending = None;
        self.elapsed = 0.0;
        self.drag = None;

        if let Some(session) = self.live.take() {
            tracing::debug!(track = %session.id, "tearing down session");
            self.engine.unload();
            self.reaper.reap(session.resource);
        }
        self.set_state(SessionState::Idle);
    }
}

fn clamp_position(seconds: f64, duration: f64) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    seconds.clamp(0.0, duration.max(0.0))
}
