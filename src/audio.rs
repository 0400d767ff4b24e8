//! Playback engine capability consumed by the session manager.
//!
//! The engine renders a local file as audio and reports position and
//! end-of-stream as events; `RodioEngine` is the production implementation.

mod engine;
mod rodio_engine;

pub use engine::{EngineError, EngineEvent, PlaybackEngine};
pub use rodio_engine::RodioEngine;
