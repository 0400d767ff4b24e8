//! `rodio` backed playback engine.
//!
//! One output stream lives for the whole client; each loaded resource gets
//! its own paused `Sink`, dropped on `unload` so the file is released.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::engine::{EngineError, EngineEvent, PlaybackEngine};

pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    playing: bool,
    ended: bool,
    events: Vec<EngineEvent>,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn new() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::NoOutputDevice(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which would
        // land on top of the terminal UI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            playing: false,
            ended: false,
            events: Vec::new(),
        })
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, EngineError> {
        self.unload();

        let file = File::open(path).map_err(|source| EngineError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode(e.to_string()))?;
        let total = source.total_duration();

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();

        self.sink = Some(sink);
        self.ended = false;
        self.events.push(EngineEvent::Ready);
        Ok(total)
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
            self.playing = false;
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
            if let Err(e) = sink.try_seek(Duration::ZERO) {
                tracing::debug!(error = %e, "rewind on stop failed");
            }
        }
        self.playing = false;
        self.ended = false;
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.playing = false;
        self.ended = false;
        self.events.clear();
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        sink.try_seek(position)
            .map_err(|e| EngineError::Seek(e.to_string()))?;
        self.ended = false;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        if let Some(sink) = &self.sink {
            if self.playing {
                if sink.empty() {
                    if !self.ended {
                        self.ended = true;
                        self.playing = false;
                        self.events.push(EngineEvent::EndOfMedia);
                    }
                } else {
                    self.events
                        .push(EngineEvent::PositionUpdated(sink.get_pos().as_secs_f64()));
                }
            }
        }
        std::mem::take(&mut self.events)
    }
}
