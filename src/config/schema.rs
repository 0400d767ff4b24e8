use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings shared by the server and the terminal client.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub client: ClientSettings,
    pub reaper: ReaperSettings,
    pub controls: ControlsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address the delivery service listens on.
    pub bind: String,
    /// Storage root; every matching file directly inside it is a track.
    pub music_dir: PathBuf,
    /// File extensions to treat as tracks (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether dotfiles are part of the catalog.
    pub include_hidden: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:1099".to_string(),
            music_dir: PathBuf::from("music"),
            extensions: vec!["mp3".into()],
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the delivery service.
    pub server_url: String,
    /// Upper bound for any single remote call (milliseconds).
    pub request_timeout_ms: u64,
    /// Largest track body the client accepts.
    pub max_track_bytes: u64,
    /// Where materialized tracks are written. System temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:1099".to_string(),
            request_timeout_ms: 30_000,
            max_track_bytes: 512 * 1024 * 1024,
            temp_dir: None,
        }
    }
}

impl ClientSettings {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaperSettings {
    /// Wait before the first deletion attempt, so the engine can release the file.
    pub quiescence_ms: u64,
    /// Number of deletion attempts before the file is abandoned.
    pub attempts: u32,
    /// Wait between failed attempts.
    pub backoff_ms: u64,
}

impl Default for ReaperSettings {
    fn default() -> Self {
        Self {
            quiescence_ms: 500,
            attempts: 5,
            backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Idle time after the last scrub key before the seek is committed.
    pub scrub_commit_ms: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            scrub_commit_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Log file. The client falls back to `cadenza.log` in the temp dir,
    /// the server to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
