//! Application model types: `App` and `NowPlaying`.
//!
//! `App` is the browsing side of the client: the catalog, the cursor, the
//! search prompt and the latest notice. `NowPlaying` is a per-frame snapshot
//! of the session for the renderer.

use std::path::PathBuf;

use crate::library::{TrackId, TrackMetadata};
use crate::session::{Notice, Progress, SessionState};

/// What the status box shows about the current track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlaying {
    pub state: SessionState,
    pub track: Option<TrackId>,
    pub metadata: Option<TrackMetadata>,
    /// Local copy the engine is playing from.
    pub resource: Option<PathBuf>,
    pub progress: Progress,
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub catalog: Vec<TrackId>,
    /// Results of the last submitted search; replaces the catalog view.
    pub search_results: Option<Vec<TrackId>>,
    /// Cursor position within `visible()`.
    pub selected: usize,

    pub filter_mode: bool,
    pub filter_query: String,
    /// Query the current `search_results` answer.
    pub submitted_query: Option<String>,

    pub catalog_loaded: bool,
    pub notice: Option<Notice>,
    pub metadata_window: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Replace the catalog. Any previous search is dropped.
    pub fn set_catalog(&mut self, catalog: Vec<TrackId>) {
        self.catalog = catalog;
        self.catalog_loaded = true;
        self.search_results = None;
        self.submitted_query = None;
        self.selected = 0;
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Tracks currently listed: search results if any, else the catalog.
    pub fn visible(&self) -> &[TrackId] {
        self.search_results.as_deref().unwrap_or(&self.catalog)
    }

    pub fn selected_track(&self) -> Option<&TrackId> {
        self.visible().get(self.selected)
    }

    /// Move the cursor onto `id` if it is listed.
    pub fn focus(&mut self, id: &TrackId) {
        if let Some(pos) = self.visible().iter().position(|t| t == id) {
            self.selected = pos;
        }
    }

    /// Move selection to the next visible track, wrapping around.
    pub fn next(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move selection to the previous visible track, wrapping around.
    pub fn prev(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
    }

    /// Leave the prompt, keeping results on screen.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Drop the query and results and show the whole catalog again.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.search_results = None;
        self.submitted_query = None;
        self.selected = 0;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
    }

    /// Install search results, unless a newer query was submitted since.
    pub fn set_search_results(&mut self, query: &str, results: Vec<TrackId>) -> bool {
        if self.submitted_query.as_deref() != Some(query) {
            return false;
        }
        self.search_results = Some(results);
        self.selected = 0;
        true
    }

    /// Case-insensitive substring match: the char positions in `title`
    /// covered by `query`, or `None` if it does not occur.
    pub fn match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        fn fold(c: char) -> char {
            c.to_lowercase().next().unwrap_or(c)
        }

        let query: Vec<char> = query.chars().map(fold).collect();
        if query.is_empty() {
            return Some(Vec::new());
        }
        let title: Vec<char> = title.chars().map(fold).collect();
        if title.len() < query.len() {
            return None;
        }

        title
            .windows(query.len())
            .position(|w| w == query.as_slice())
            .map(|start| (start..start + query.len()).collect())
    }
}
