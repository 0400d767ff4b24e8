//! Server-side track library: catalog listing, track reads and metadata.
//!
//! The catalog is a flat directory of audio files; a file's name is its
//! `TrackId`.

mod metadata;
mod model;
mod scan;

pub use metadata::read_metadata;
pub use model::*;
pub use scan::{list_tracks, resolve_track};

#[cfg(test)]
mod tests;
