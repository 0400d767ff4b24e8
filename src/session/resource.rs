use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::library::{TrackBlob, TrackId};

#[derive(Debug, Error)]
#[error("failed to write local copy of {track}: {source}")]
pub struct MaterializeError {
    track: TrackId,
    #[source]
    source: io::Error,
}

/// A track written to local storage so the engine can load it by path.
///
/// Not `Clone`: whoever holds the value owns the file, first the session
/// and then the reaper.
#[derive(Debug)]
pub struct MaterializedResource {
    track: TrackId,
    path: PathBuf,
}

impl MaterializedResource {
    /// Adopt an existing file.
    pub fn adopt(track: TrackId, path: PathBuf) -> Self {
        Self { track, path }
    }

    pub fn track(&self) -> &TrackId {
        &self.track
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `blob` to a uniquely named file in `dir`.
pub fn materialize(
    dir: &Path,
    track: &TrackId,
    blob: &TrackBlob,
) -> Result<MaterializedResource, MaterializeError> {
    let err = |source: io::Error| MaterializeError {
        track: track.clone(),
        source,
    };

    let suffix = track.dotted_extension().unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix("cadenza-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(err)?;
    file.write_all(blob.as_bytes()).map_err(err)?;
    file.flush().map_err(err)?;

    let (_file, path) = file.keep().map_err(|e| err(e.error))?;
    tracing::debug!(track = %track, path = %path.display(), bytes = blob.len(), "materialized track");
    Ok(MaterializedResource::adopt(track.clone(), path))
}
