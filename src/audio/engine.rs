use std::path::Path;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported or corrupt audio: {0}")]
    Decode(String),
    #[error("seek failed: {0}")]
    Seek(String),
}

/// Events emitted by the engine, drained by the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Elapsed playback position in seconds.
    PositionUpdated(f64),
    /// A freshly loaded resource can be played.
    Ready,
    /// The loaded resource played to its end.
    EndOfMedia,
    /// Playback failed after loading.
    Error(String),
}

/// Something that can render one local audio file at a time.
pub trait PlaybackEngine {
    /// Bind the engine to `path`, paused at zero. Returns the total duration
    /// when the decoder knows it.
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, EngineError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Halt and rewind; the resource stays loaded.
    fn stop(&mut self);

    /// Stop and release the loaded resource, including its file handle.
    fn unload(&mut self);

    fn seek(&mut self, position: Duration) -> Result<(), EngineError>;

    /// Events produced since the last call, oldest first.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
}
