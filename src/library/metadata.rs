use std::path::Path;

use lofty::prelude::*;

use super::model::{DEFAULT_BITRATE_BPS, DEFAULT_DURATION_SECS, TrackId, TrackMetadata};

/// Derive metadata for the file at `path`.
///
/// Never fails: when the file cannot be introspected the fixed defaults are
/// returned, with a total size of zero.
pub fn read_metadata(path: &Path, id: &TrackId) -> TrackMetadata {
    let mut metadata = TrackMetadata::defaults_for(id);

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            tracing::debug!(track = %id, error = %e, "no audio properties, using defaults");
            return metadata;
        }
    };

    let properties = tagged.properties();
    let secs = properties.duration().as_secs();
    metadata.duration = if secs == 0 {
        DEFAULT_DURATION_SECS.to_string()
    } else {
        secs.to_string()
    };
    metadata.bitrate = properties
        .audio_bitrate()
        .or_else(|| properties.overall_bitrate())
        .map(|kbps| u64::from(kbps) * 1000)
        .unwrap_or(DEFAULT_BITRATE_BPS)
        .to_string();
    metadata.total_bytes = std::fs::metadata(path)
        .map(|m| m.len())
        .unwrap_or(0)
        .to_string();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.artist().filter(|v| !v.trim().is_empty()) {
            metadata.artist = v.trim().to_string();
        }
        if let Some(v) = tag.album().filter(|v| !v.trim().is_empty()) {
            metadata.album = v.trim().to_string();
        }
    }

    metadata
}
