use std::io::{self, Write};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

/// Holds the terminal in raw mode on the alternate screen, the previous
/// state is restored when dropped.
pub(crate) struct RawScreen;

impl RawScreen {
    pub fn enter() -> crossterm::Result<Self> {
        terminal::enable_raw_mode()?;
        // from here on drop cleans up, even if the rest fails
        let screen = Self;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        log::debug!("entered the alternate screen");
        Ok(screen)
    }
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        if let Err(err) = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen) {
            log::warn!("unable to leave the alternate screen: {}", err);
        }
        if let Err(err) = terminal::disable_raw_mode() {
            log::warn!("unable to leave raw mode: {}", err);
        }
    }
}
