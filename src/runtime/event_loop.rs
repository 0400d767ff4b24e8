use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{Intent, Reply, TransportController};
use crate::audio::PlaybackEngine;
use crate::config;
use crate::session::Reap;
use crate::ui;

use super::worker::Workers;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Main terminal event loop: handles input, draws the UI, folds worker
/// replies and engine events into the session. Returns `Ok(())` when the
/// user quits.
pub fn run<E: PlaybackEngine, R: Reap>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    controller: &mut TransportController<E, R>,
    workers: &Workers,
    replies: &Receiver<Reply>,
) -> anyhow::Result<()> {
    loop {
        while let Ok(reply) = replies.try_recv() {
            controller.apply(reply);
        }
        workers.spawn_all(controller.tick(Instant::now()));

        let now_playing = controller.now_playing();
        terminal.draw(|f| ui::draw(f, controller.app(), &now_playing, &settings.controls))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(intent) = intent_for(key, controller.app().filter_mode) {
                    workers.spawn_all(controller.handle(intent));
                }
                if controller.should_quit() {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Translate a key press. While the search prompt is open every printable
/// key is part of the query.
pub fn intent_for(key: KeyEvent, filter_mode: bool) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Intent::Quit);
    }

    if filter_mode {
        return match key.code {
            KeyCode::Esc => Some(Intent::CancelSearch),
            KeyCode::Enter => Some(Intent::SubmitSearch),
            KeyCode::Backspace => Some(Intent::SearchBackspace),
            KeyCode::Char(c) if !c.is_control() => Some(Intent::SearchChar(c)),
            _ => None,
        };
    }

    let intent = match key.code {
        KeyCode::Char('q') => Intent::Quit,
        KeyCode::Char('j') | KeyCode::Down => Intent::CursorDown,
        KeyCode::Char('k') | KeyCode::Up => Intent::CursorUp,
        KeyCode::Enter => Intent::PlaySelected,
        KeyCode::Char(' ') | KeyCode::Char('p') => Intent::TogglePlayPause,
        KeyCode::Char('s') => Intent::Stop,
        KeyCode::Char('l') => Intent::Next,
        KeyCode::Char('h') => Intent::Previous,
        KeyCode::Char('L') => Intent::ScrubForward,
        KeyCode::Char('H') => Intent::ScrubBack,
        KeyCode::Char('/') => Intent::StartSearch,
        KeyCode::Esc => Intent::CancelSearch,
        KeyCode::Char('K') => Intent::ToggleMetadata,
        KeyCode::Char('R') => Intent::Reload,
        KeyCode::Char(c @ '1'..='5') => Intent::Rate(c as i32 - '0' as i32),
        _ => return None,
    };
    Some(intent)
}
