mod actions;
mod admin_view;
mod render;
mod session;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::admin::AppMode;
use super::root::Root;
use super::theme::system_prefers_dark;

use self::actions::{Flow, handle_key};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct PasswordForm {
    pub(super) new: String,
    pub(super) confirm: String,
    pub(super) on_confirm: bool,
}

/// Which text field, if any, is receiving keystrokes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) enum InputMode {
    #[default]
    Normal,
    Search,
    ListQuery,
    AdminLogin(String),
    ChangePassword(PasswordForm),
    SupportLink(String),
    SupportImage(String),
}

impl InputMode {
    pub(super) fn is_typing(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

pub(crate) fn run_tui(root: &mut Root) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut input = InputMode::Normal;

    loop {
        root.tick();
        if root.mode() == AppMode::Admin
            && !root.admin().authenticated
            && !matches!(input, InputMode::AdminLogin(_))
        {
            input = InputMode::AdminLogin(String::new());
        }

        terminal.draw(|frame| draw_tui(frame, root, &input))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        match event::read()? {
            Event::FocusGained => root.on_system_color_scheme(system_prefers_dark()),
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key(root, &mut input, key) == Flow::Quit {
                    break;
                }
            }
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
