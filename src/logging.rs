//! `tracing` subscriber setup.
//!
//! The server logs to stderr. The terminal client owns the screen, so its
//! logs always go to a file.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingSettings;

const CLIENT_LOG_FILE: &str = "cadenza.log";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Where the client writes its log when none is configured.
pub fn client_log_path(settings: &LoggingSettings, temp_dir: &Path) -> PathBuf {
    settings
        .file
        .clone()
        .unwrap_or_else(|| temp_dir.join(CLIENT_LOG_FILE))
}

/// Shared append-only file handle usable as a `MakeWriter`.
#[derive(Clone)]
struct SharedFile(Arc<Mutex<std::fs::File>>);

impl io::Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut file) => file.write(buf),
            Err(_) => Err(io::Error::other("log file lock poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.lock() {
            Ok(mut file) => file.flush(),
            Err(_) => Err(io::Error::other("log file lock poisoned")),
        }
    }
}

fn file_writer(path: &Path) -> anyhow::Result<BoxMakeWriter> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let shared = SharedFile(Arc::new(Mutex::new(file)));
    Ok(BoxMakeWriter::new(move || shared.clone()))
}

fn install(level: &str, writer: BoxMakeWriter, ansi: bool) {
    // A subscriber may already be installed (tests); keep the first one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_ansi(ansi)
        .with_writer(writer)
        .try_init();
}

pub fn init_server(settings: &LoggingSettings) -> anyhow::Result<()> {
    let writer = match &settings.file {
        Some(path) => file_writer(path)?,
        None => BoxMakeWriter::new(io::stderr),
    };
    install(&settings.level, writer, settings.file.is_none());
    Ok(())
}

pub fn init_client(settings: &LoggingSettings, temp_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = client_log_path(settings, temp_dir);
    install(&settings.level, file_writer(&path)?, false);
    Ok(path)
}
