use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{Intent, Reply, TransportController};
use crate::audio::RodioEngine;
use crate::config::Settings;
use crate::delivery::{DeliveryService, RemoteLibrary, server};
use crate::logging;
use crate::session::{ReapPolicy, Reaper, SessionManager};

mod event_loop;
mod terminal;
mod worker;

use terminal::TerminalGuard;
use worker::Workers;

/// Upper bound for letting reaper tasks finish on quit.
fn reap_drain_timeout(policy: &ReapPolicy) -> Duration {
    policy.quiescence + policy.backoff * policy.attempts + Duration::from_secs(1)
}

pub fn run_server(mut settings: Settings, music_dir: Option<PathBuf>) -> anyhow::Result<()> {
    logging::init_server(&settings.logging)?;
    if let Some(dir) = music_dir {
        settings.server.music_dir = dir;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(server::serve(settings.server))
}

pub fn run_client(mut settings: Settings, server_url: Option<String>) -> anyhow::Result<()> {
    if let Some(url) = server_url {
        settings.client.server_url = url;
    }
    let temp_dir = settings.client.temp_dir();
    let log_path = logging::init_client(&settings.logging, &temp_dir)?;
    tracing::info!(
        server = %settings.client.server_url,
        log = %log_path.display(),
        "starting client"
    );

    let service: Arc<dyn DeliveryService> = Arc::new(RemoteLibrary::new(&settings.client));
    let engine = RodioEngine::new().context("opening audio output")?;
    let policy = ReapPolicy::from(&settings.reaper);
    let session = SessionManager::new(engine, Reaper::new(policy), temp_dir);
    let mut controller = TransportController::new(session, &settings.controls);

    let (reply_tx, reply_rx) = mpsc::channel::<Reply>();
    let workers = Workers::new(service, reply_tx);
    workers.spawn_all(controller.start());

    let run_result = {
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        event_loop::run(&mut terminal, &settings, &mut controller, &workers, &reply_rx)
    };

    // An error exit skips the quit intent; release the file either way.
    if !controller.should_quit() {
        controller.handle(Intent::Quit);
    }
    let reaper = controller.session().reaper();
    if !reaper.wait_idle(reap_drain_timeout(&policy)) {
        tracing::warn!(in_flight = reaper.in_flight(), "exiting with temp files pending deletion");
    }

    run_result
}
