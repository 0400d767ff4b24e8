//! Maps user intents onto the session and the browsing model.
//!
//! The controller never blocks: anything that needs the remote service is
//! returned as a `Job`, run by the runtime on a worker thread, and comes
//! back as a `Reply` through `apply`.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::audio::PlaybackEngine;
use crate::config::ControlsSettings;
use crate::delivery::{DeliveryError, DeliveryService};
use crate::library::TrackId;
use crate::session::{
    CONNECT_FAILED, LoadOutcome, LoadRequest, Notice, Reap, SessionManager, SessionState,
};

use super::model::{App, NowPlaying};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CursorDown,
    CursorUp,
    PlaySelected,
    TogglePlayPause,
    Stop,
    Next,
    Previous,
    ScrubForward,
    ScrubBack,
    StartSearch,
    SearchChar(char),
    SearchBackspace,
    SubmitSearch,
    CancelSearch,
    Rate(i32),
    ToggleMetadata,
    Reload,
    Quit,
}

/// Remote work for a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Load(LoadRequest),
    Search(String),
    Rate(TrackId, i32),
    Catalog,
}

/// A finished `Job`, marshaled back to the control thread.
#[derive(Debug)]
pub enum Reply {
    Loaded(LoadOutcome),
    Searched {
        query: String,
        result: Result<Vec<TrackId>, DeliveryError>,
    },
    Rated {
        id: TrackId,
        score: i32,
        result: Result<(), DeliveryError>,
    },
    Catalog(Result<Vec<TrackId>, DeliveryError>),
}

impl Job {
    /// Perform the remote call. Blocks for up to the client's timeout.
    pub fn run(self, service: &dyn DeliveryService) -> Reply {
        match self {
            Job::Load(request) => Reply::Loaded(request.run(service)),
            Job::Search(query) => {
                let result = service.search(&query);
                Reply::Searched { query, result }
            }
            Job::Rate(id, score) => {
                let result = service.rate(&id, score);
                Reply::Rated { id, score, result }
            }
            Job::Catalog => Reply::Catalog(service.list_tracks()),
        }
    }

    /// The reply for a job that could not be run at all.
    pub fn fail(self, error: DeliveryError) -> Reply {
        match self {
            Job::Load(request) => Reply::Loaded(LoadOutcome {
                generation: request.generation,
                id: request.id,
                result: Err(error),
            }),
            Job::Search(query) => Reply::Searched {
                query,
                result: Err(error),
            },
            Job::Rate(id, score) => Reply::Rated {
                id,
                score,
                result: Err(error),
            },
            Job::Catalog => Reply::Catalog(Err(error)),
        }
    }
}

/// A keyboard seek drag waiting to be committed.
#[derive(Debug, Clone, Copy)]
struct Scrub {
    last_key: Instant,
}

pub struct TransportController<E: PlaybackEngine, R: Reap> {
    session: SessionManager<E, R>,
    app: App,
    scrub_step: f64,
    scrub_commit: Duration,
    scrub: Option<Scrub>,
    followed: Option<TrackId>,
    quit: bool,
}

impl<E: PlaybackEngine, R: Reap> TransportController<E, R> {
    pub fn new(session: SessionManager<E, R>, controls: &ControlsSettings) -> Self {
        Self {
            session,
            app: App::new(),
            scrub_step: controls.scrub_seconds as f64,
            scrub_commit: Duration::from_millis(controls.scrub_commit_ms),
            scrub: None,
            followed: None,
            quit: false,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn session(&self) -> &SessionManager<E, R> {
        &self.session
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn now_playing(&self) -> NowPlaying {
        NowPlaying {
            state: self.session.state(),
            track: self
                .session
                .live_track()
                .or(self.session.current_track())
                .cloned(),
            metadata: self.session.live_metadata().cloned(),
            resource: self.session.live_resource().map(Path::to_path_buf),
            progress: self.session.progress(),
        }
    }

    /// Jobs to run once at startup.
    pub fn start(&self) -> Vec<Job> {
        vec![Job::Catalog]
    }

    pub fn handle(&mut self, intent: Intent) -> Vec<Job> {
        self.handle_at(intent, Instant::now())
    }

    pub fn handle_at(&mut self, intent: Intent, now: Instant) -> Vec<Job> {
        let mut jobs = Vec::new();
        match intent {
            Intent::CursorDown => self.app.next(),
            Intent::CursorUp => self.app.prev(),
            Intent::PlaySelected => {
                if let Some(id) = self.app.selected_track().cloned() {
                    let already_playing = self.session.state() == SessionState::Playing
                        && self.session.live_track() == Some(&id);
                    if !already_playing {
                        jobs.push(Job::Load(self.session.select_track(id)));
                    }
                }
            }
            Intent::TogglePlayPause => jobs.extend(self.session.toggle_play_pause().map(Job::Load)),
            Intent::Stop => {
                self.scrub = None;
                self.session.stop();
            }
            Intent::Next => jobs.extend(self.session.next().map(Job::Load)),
            Intent::Previous => jobs.extend(self.session.previous().map(Job::Load)),
            Intent::ScrubForward => self.scrub_by(self.scrub_step, now),
            Intent::ScrubBack => self.scrub_by(-self.scrub_step, now),
            Intent::StartSearch => self.app.enter_filter_mode(),
            Intent::SearchChar(c) => self.app.push_filter_char(c),
            Intent::SearchBackspace => self.app.pop_filter_char(),
            Intent::SubmitSearch => {
                let query = self.app.filter_query.trim().to_string();
                self.app.exit_filter_mode();
                if query.is_empty() {
                    self.app.clear_filter();
                } else {
                    self.app.submitted_query = Some(query.clone());
                    jobs.push(Job::Search(query));
                }
            }
            Intent::CancelSearch => self.app.clear_filter(),
            Intent::Rate(score) => {
                if let Some(id) = self.session.live_track() {
                    jobs.push(Job::Rate(id.clone(), score.clamp(1, 5)));
                }
            }
            Intent::ToggleMetadata => self.app.toggle_metadata_window(),
            Intent::Reload => {
                self.app.clear_notice();
                jobs.push(Job::Catalog);
            }
            Intent::Quit => {
                self.scrub = None;
                self.session.teardown();
                self.quit = true;
            }
        }
        self.sync_view();
        jobs
    }

    fn scrub_by(&mut self, delta: f64, now: Instant) {
        if self.session.live_track().is_none() {
            return;
        }
        if !self.session.is_dragging() {
            self.session.begin_seek_drag();
        }
        let target = self.session.progress().elapsed + delta;
        self.session.drag_seek_to(target);
        self.scrub = Some(Scrub { last_key: now });
    }

    /// Periodic work: drain engine events and commit an idle scrub.
    pub fn tick(&mut self, now: Instant) -> Vec<Job> {
        if let Some(scrub) = self.scrub {
            if now.saturating_duration_since(scrub.last_key) >= self.scrub_commit {
                self.scrub = None;
                self.session.end_seek_drag();
            }
        }

        let jobs = self
            .session
            .pump_engine()
            .into_iter()
            .map(Job::Load)
            .collect();
        self.sync_view();
        jobs
    }

    /// Fold a worker result back into the session and the view.
    pub fn apply(&mut self, reply: Reply) {
        match reply {
            Reply::Loaded(outcome) => self.session.finish_load(outcome),
            Reply::Catalog(Ok(tracks)) => {
                tracing::info!(count = tracks.len(), "catalog loaded");
                self.session.set_catalog(tracks.clone());
                self.app.set_catalog(tracks);
                self.followed = None;
            }
            Reply::Catalog(Err(e)) => {
                tracing::warn!(error = %e, "loading catalog failed");
                let message = if e.is_transport() {
                    CONNECT_FAILED.to_string()
                } else {
                    format!("Failed to load the catalog: {e}")
                };
                self.app.show_notice(Notice::new("Error", message));
            }
            Reply::Searched { query, result } => match result {
                Ok(results) => {
                    if !self.app.set_search_results(&query, results) {
                        tracing::debug!(query = %query, "dropping stale search results");
                    }
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "search failed");
                    self.app
                        .show_notice(Notice::new("Error", "Search failed."));
                }
            },
            Reply::Rated { id, score, result } => match result {
                Ok(()) => tracing::info!(track = %id, score, "rating sent"),
                Err(e) => {
                    tracing::warn!(track = %id, error = %e, "rating failed");
                    self.app
                        .show_notice(Notice::new("Error", "Failed to rate the track."));
                }
            },
        }
        self.sync_view();
    }

    /// Surface session notices and keep the cursor on a newly selected track.
    fn sync_view(&mut self) {
        if let Some(notice) = self.session.take_notices().pop() {
            self.app.show_notice(notice);
        }

        let current = self.session.current_track();
        if current != self.followed.as_ref() {
            self.followed = current.cloned();
            if let Some(id) = self.followed.clone() {
                if !self.app.filter_mode {
                    self.app.focus(&id);
                }
                if self.session.state() == SessionState::Loading {
                    self.app.clear_notice();
                }
            }
        }
    }
}
