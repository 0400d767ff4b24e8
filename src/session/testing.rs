//! Fakes for exercising the session without audio hardware or a server.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::{EngineError, EngineEvent, PlaybackEngine};
use crate::delivery::{DeliveryError, DeliveryService, filter_tracks};
use crate::library::{TrackBlob, TrackId, TrackMetadata};

use super::{MaterializedResource, Reap};

#[derive(Default)]
pub struct FakeEngine {
    pub calls: Vec<String>,
    pub loaded: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub reject_loads: bool,
    pub events: Vec<EngineEvent>,
}

impl FakeEngine {
    pub fn with_duration(secs: u64) -> Self {
        Self {
            duration: Some(Duration::from_secs(secs)),
            ..Self::default()
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn seeks(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|c| c.starts_with("seek"))
            .map(String::as_str)
            .collect()
    }
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, EngineError> {
        self.calls.push("load".into());
        if self.reject_loads {
            return Err(EngineError::Decode("unsupported format".into()));
        }
        self.loaded = Some(path.to_path_buf());
        Ok(self.duration)
    }

    fn play(&mut self) {
        self.calls.push("play".into());
    }

    fn pause(&mut self) {
        self.calls.push("pause".into());
    }

    fn stop(&mut self) {
        self.calls.push("stop".into());
    }

    fn unload(&mut self) {
        self.calls.push("unload".into());
        self.loaded = None;
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        self.calls.push(format!("seek {}", position.as_secs()));
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Keeps every reaped resource so tests can inspect ownership handoffs.
#[derive(Default)]
pub struct RecordingReaper {
    pub reaped: RefCell<Vec<MaterializedResource>>,
}

impl RecordingReaper {
    pub fn reaped_tracks(&self) -> Vec<String> {
        self.reaped
            .borrow()
            .iter()
            .map(|r| r.track().to_string())
            .collect()
    }
}

impl Reap for RecordingReaper {
    fn reap(&self, resource: MaterializedResource) {
        self.reaped.borrow_mut().push(resource);
    }
}

/// In-memory catalog.
#[derive(Default)]
pub struct FakeService {
    pub tracks: Vec<(TrackId, Vec<u8>)>,
    pub unavailable: bool,
    /// Track fetches fail as if the server could not read the file.
    pub unreadable: bool,
}

impl FakeService {
    pub fn with_tracks(names: &[&str]) -> Self {
        Self {
            tracks: names
                .iter()
                .map(|n| (TrackId::from(*n), n.as_bytes().to_vec()))
                .collect(),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), DeliveryError> {
        if self.unavailable {
            return Err(DeliveryError::RemoteUnavailable("connection refused".into()));
        }
        Ok(())
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl DeliveryService for FakeService {
    fn list_tracks(&self) -> Result<Vec<TrackId>, DeliveryError> {
        self.check()?;
        Ok(self.ids())
    }

    fn fetch_track(&self, id: &TrackId) -> Result<TrackBlob, DeliveryError> {
        self.check()?;
        if self.unreadable {
            return Err(DeliveryError::IoFailure("permission denied".into()));
        }
        self.tracks
            .iter()
            .find(|(track, _)| track == id)
            .map(|(_, bytes)| TrackBlob::from(bytes.clone()))
            .ok_or_else(|| DeliveryError::NotFound(id.clone()))
    }

    fn fetch_metadata(&self, id: &TrackId) -> Result<TrackMetadata, DeliveryError> {
        self.check()?;
        Ok(TrackMetadata::defaults_for(id))
    }

    fn search(&self, query: &str) -> Result<Vec<TrackId>, DeliveryError> {
        self.check()?;
        Ok(filter_tracks(self.ids(), query))
    }

    fn rate(&self, _id: &TrackId, _score: i32) -> Result<(), DeliveryError> {
        self.check()
    }
}
