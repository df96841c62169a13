use std::io;

use anyhow::{Context, Result};
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

/// Raw mode, alternate screen and focus reporting for as long as it lives.
pub(super) struct TuiSession {
    active: bool,
}

impl TuiSession {
    pub(super) fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen, EnableFocusChange)
            .context("failed to enter alternate screen")?;
        Ok(Self { active: true })
    }

    pub(super) fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        disable_raw_mode().context("failed to disable raw mode")?;
        execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen)
            .context("failed to leave alternate screen")?;
        self.active = false;
        Ok(())
    }
}

impl Drop for TuiSession {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen);
        }
    }
}
