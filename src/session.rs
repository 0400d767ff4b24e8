//! Client-side playback session lifecycle.
//!
//! `SessionManager` turns a remote track into a locally playable resource,
//! drives the playback engine, and hands finished resources to the
//! `Reaper`, which deletes them in the background.

mod manager;
mod reaper;
mod resource;
mod state;

pub use manager::{FetchedTrack, LoadOutcome, LoadRequest, SessionManager};
pub(crate) use manager::{CONNECT_FAILED, PLAY_FAILED};
pub use reaper::{
    FileRemover, FsRemover, Reap, ReapOutcome, ReapPolicy, Reaper, ReaperTask, Sleeper,
    ThreadSleeper,
};
pub use resource::{MaterializeError, MaterializedResource, materialize};
pub use state::{Notice, Progress, SessionState};

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;
