use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ServerSettings;

use super::model::TrackId;

fn is_audio_file(path: &Path, settings: &ServerSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// List the catalog: regular files directly under `dir` with a configured
/// extension, sorted by name. A missing or unreadable directory is empty.
pub fn list_tracks(dir: &Path, settings: &ServerSettings) -> Vec<TrackId> {
    let mut tracks: Vec<TrackId> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| settings.include_hidden || !is_hidden(path))
        .filter(|path| is_audio_file(path, settings))
        .filter_map(|path| {
            path.file_name()
                .and_then(|s| s.to_str())
                .map(TrackId::from)
        })
        .collect();

    tracks.sort();
    tracks
}

/// Map a `TrackId` to its file under `dir`.
///
/// Ids that would leave the storage root never resolve. Existence is not
/// checked here.
pub fn resolve_track(dir: &Path, id: &TrackId) -> Option<PathBuf> {
    let name = id.as_str();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return None;
    }
    Some(dir.join(name))
}
