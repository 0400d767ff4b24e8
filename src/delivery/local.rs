use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::ServerSettings;
use crate::library::{TrackBlob, TrackId, TrackMetadata, list_tracks, read_metadata, resolve_track};

use super::{DeliveryError, DeliveryService, filter_tracks};

/// The catalog as seen from the server: a directory of audio files.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    settings: ServerSettings,
}

impl LocalLibrary {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }

    pub fn root(&self) -> &PathBuf {
        &self.settings.music_dir
    }

    fn existing_file(&self, id: &TrackId) -> Result<PathBuf, DeliveryError> {
        let path = resolve_track(self.root(), id).ok_or_else(|| DeliveryError::NotFound(id.clone()))?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Err(DeliveryError::NotFound(id.clone())),
            Ok(_) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DeliveryError::NotFound(id.clone())),
            Err(e) => Err(DeliveryError::IoFailure(e.to_string())),
        }
    }
}

impl DeliveryService for LocalLibrary {
    fn list_tracks(&self) -> Result<Vec<TrackId>, DeliveryError> {
        Ok(list_tracks(self.root(), &self.settings))
    }

    fn fetch_track(&self, id: &TrackId) -> Result<TrackBlob, DeliveryError> {
        let path = self.existing_file(id)?;
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(track = %id, bytes = bytes.len(), "serving track");
                Ok(TrackBlob::from(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DeliveryError::NotFound(id.clone())),
            Err(e) => {
                tracing::warn!(track = %id, error = %e, "error reading track");
                Err(DeliveryError::IoFailure(e.to_string()))
            }
        }
    }

    fn fetch_metadata(&self, id: &TrackId) -> Result<TrackMetadata, DeliveryError> {
        let metadata = match resolve_track(self.root(), id) {
            Some(path) => read_metadata(&path, id),
            None => TrackMetadata::defaults_for(id),
        };
        Ok(metadata)
    }

    fn search(&self, query: &str) -> Result<Vec<TrackId>, DeliveryError> {
        Ok(filter_tracks(self.list_tracks()?, query))
    }

    fn rate(&self, id: &TrackId, score: i32) -> Result<(), DeliveryError> {
        tracing::info!(track = %id, score, "Track {id} rated with {score} stars.");
        Ok(())
    }
}
