use std::io;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

/// Puts the terminal back the way it was when dropped, including when
/// setup fails halfway through.
pub struct TerminalGuard {
    restore: Box<dyn FnMut()>,
}

impl TerminalGuard {
    /// Enable raw mode and switch to the alternate screen.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self::new(restore_terminal);
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }

    fn new(restore: impl FnMut() + 'static) -> Self {
        Self {
            restore: Box::new(restore),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    // Best effort: there is nowhere left to report a failure.
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}
