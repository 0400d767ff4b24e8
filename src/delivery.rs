//! The track delivery contract shared by the server and the client.
//!
//! `DeliveryService` is the remote contract. `LocalLibrary` implements it
//! over a directory on the server, `server` exposes it over HTTP and
//! `RemoteLibrary` implements it on the client by calling that server.

mod client;
mod error;
mod local;
pub mod server;

pub use client::RemoteLibrary;
pub use error::{DeliveryError, ErrorBody};
pub use local::LocalLibrary;

use crate::library::{TrackBlob, TrackId, TrackMetadata};

/// Operations a client may invoke on the track catalog.
pub trait DeliveryService: Send + Sync {
    /// Every track currently servable.
    fn list_tracks(&self) -> Result<Vec<TrackId>, DeliveryError>;

    /// Full content of one track.
    fn fetch_track(&self, id: &TrackId) -> Result<TrackBlob, DeliveryError>;

    /// Descriptive fields of one track. Implementations degrade to defaults
    /// instead of failing; only transport problems surface as errors.
    fn fetch_metadata(&self, id: &TrackId) -> Result<TrackMetadata, DeliveryError>;

    /// Tracks whose id contains `query`, ignoring case.
    fn search(&self, query: &str) -> Result<Vec<TrackId>, DeliveryError>;

    /// Record a rating. Acknowledged, never stored.
    fn rate(&self, id: &TrackId, score: i32) -> Result<(), DeliveryError>;
}

/// Case-insensitive substring filter over a track listing.
pub fn filter_tracks(tracks: Vec<TrackId>, query: &str) -> Vec<TrackId> {
    let query = query.to_lowercase();
    tracks
        .into_iter()
        .filter(|t| t.as_str().to_lowercase().contains(&query))
        .collect()
}
