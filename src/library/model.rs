use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_SECS: u64 = 180;
pub const DEFAULT_BITRATE_BPS: u64 = 192_000;
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Name of a track within the catalog (the file name on the server).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension including the leading dot, used to name local copies.
    pub fn dotted_extension(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || ext.contains(['/', '\\']) {
            return None;
        }
        Some(format!(".{ext}"))
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Descriptive fields of one track. Every field is always populated; values
/// that could not be determined carry fixed defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Bitrate")]
    pub bitrate: String,
    #[serde(rename = "TotalBytes")]
    pub total_bytes: String,
    #[serde(rename = "TrackName")]
    pub track_name: String,
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Album")]
    pub album: String,
}

impl TrackMetadata {
    /// Metadata for a track nothing could be learned about.
    pub fn defaults_for(id: &TrackId) -> Self {
        Self {
            duration: DEFAULT_DURATION_SECS.to_string(),
            bitrate: DEFAULT_BITRATE_BPS.to_string(),
            total_bytes: "0".to_string(),
            track_name: id.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
        }
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration.parse().unwrap_or(DEFAULT_DURATION_SECS)
    }

    pub fn bitrate_bps(&self) -> u64 {
        self.bitrate.parse().unwrap_or(DEFAULT_BITRATE_BPS)
    }
}

/// Full encoded content of one track.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackBlob(Vec<u8>);

impl TrackBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for TrackBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for TrackBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackBlob({} bytes)", self.0.len())
    }
}
