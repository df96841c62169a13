use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::super::admin::AppMode;
use super::super::root::{Modal, Root, SKIP_SECONDS, VOLUME_STEP, status_error, status_info};
use super::{InputMode, PasswordForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Quit,
}

pub(super) fn handle_key(root: &mut Root, input: &mut InputMode, key: KeyEvent) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    if root.modal().is_some() {
        handle_modal_key(root, key);
        return Flow::Continue;
    }

    if input.is_typing() {
        handle_input_key(root, input, key);
        return Flow::Continue;
    }

    if root.mode() == AppMode::Admin {
        return handle_admin_key(root, input, key);
    }

    handle_main_key(root, input, key)
}

fn handle_modal_key(root: &mut Root, key: KeyEvent) {
    let close = match root.modal_mut() {
        Some(Modal::Flashcards(deck)) => match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                deck.previous();
                false
            }
            KeyCode::Right | KeyCode::Char('l') => {
                deck.next();
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                deck.flip();
                false
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => true,
            _ => false,
        },
        Some(_) => true,
        None => false,
    };
    if close {
        root.close_modal();
    }
}

fn edit_text(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(ch) => buffer.push(ch),
        KeyCode::Backspace => {
            buffer.pop();
        }
        _ => {}
    }
}

fn handle_input_key(root: &mut Root, input: &mut InputMode, key: KeyEvent) {
    match input {
        InputMode::Normal => {}
        InputMode::Search => match key.code {
            KeyCode::Enter => *input = InputMode::Normal,
            KeyCode::Esc => {
                root.set_search(String::new());
                *input = InputMode::Normal;
            }
            code => {
                let mut query = root.search().to_string();
                edit_text(&mut query, code);
                root.set_search(query);
            }
        },
        InputMode::ListQuery => match key.code {
            KeyCode::Enter => *input = InputMode::Normal,
            KeyCode::Esc => {
                root.set_list_query(String::new());
                *input = InputMode::Normal;
            }
            code => {
                let mut query = root.list_query().to_string();
                edit_text(&mut query, code);
                root.set_list_query(query);
            }
        },
        InputMode::AdminLogin(password) => match key.code {
            KeyCode::Enter => {
                let attempt = std::mem::take(password);
                if root.admin_login(&attempt) {
                    *input = InputMode::Normal;
                }
            }
            KeyCode::Esc => {
                root.exit_admin();
                *input = InputMode::Normal;
            }
            code => edit_text(password, code),
        },
        InputMode::ChangePassword(form) => match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.on_confirm = !form.on_confirm;
            }
            KeyCode::Enter if !form.on_confirm => form.on_confirm = true,
            KeyCode::Enter => {
                let PasswordForm { new, confirm, .. } = std::mem::take(form);
                if root.admin_change_password(&new, &confirm) {
                    *input = InputMode::Normal;
                }
            }
            KeyCode::Esc => *input = InputMode::Normal,
            code => {
                let field = if form.on_confirm {
                    &mut form.confirm
                } else {
                    &mut form.new
                };
                edit_text(field, code);
            }
        },
        InputMode::SupportLink(link) => match key.code {
            KeyCode::Enter => {
                let link = std::mem::take(link);
                root.admin_save_support_link(&link);
                *input = InputMode::Normal;
            }
            KeyCode::Esc => *input = InputMode::Normal,
            code => edit_text(link, code),
        },
        InputMode::SupportImage(path) => match key.code {
            KeyCode::Enter => {
                let path = PathBuf::from(std::mem::take(path).trim());
                root.admin_store_support_image(&path);
                *input = InputMode::Normal;
            }
            KeyCode::Esc => *input = InputMode::Normal,
            code => edit_text(path, code),
        },
    }
}

fn report(root: &mut Root, result: Result<()>, what: &str) {
    if let Err(err) = result {
        root.status = status_error(&format!("{what} failed: {err}"));
    }
}

fn handle_main_key(root: &mut Root, input: &mut InputMode, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('/') => *input = InputMode::Search,
        KeyCode::Char('F') => *input = InputMode::ListQuery,
        KeyCode::Tab => root.cycle_category(true),
        KeyCode::BackTab => root.cycle_category(false),
        KeyCode::Up | KeyCode::Char('k') => root.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => root.move_cursor(1),
        KeyCode::Enter => root.select_at_cursor(),
        KeyCode::Char('n') => root.next_episode(),
        KeyCode::Char('p') => root.previous_episode(),
        KeyCode::Char('[') => root.history_back(),
        KeyCode::Char(']') => root.history_forward(),
        KeyCode::Char('f') => root.toggle_favorite(),
        KeyCode::Char(' ') => {
            let result = root.playback_mut().toggle_play();
            report(root, result, "Play/pause");
        }
        KeyCode::Left => {
            let result = root.playback_mut().skip(-SKIP_SECONDS);
            report(root, result, "Rewind");
        }
        KeyCode::Right => {
            let result = root.playback_mut().skip(SKIP_SECONDS);
            report(root, result, "Forward");
        }
        KeyCode::Char(digit @ '0'..='9') => {
            let fraction = f64::from(digit.to_digit(10).unwrap_or(0)) / 10.0;
            let target = root.playback().state().duration * fraction;
            if target.is_finite() {
                let result = root.playback_mut().seek(target);
                report(root, result, "Seek");
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = root.playback().state().volume + VOLUME_STEP;
            let result = root.playback_mut().set_volume(volume);
            report(root, result, "Volume");
        }
        KeyCode::Char('-') => {
            let volume = root.playback().state().volume - VOLUME_STEP;
            let result = root.playback_mut().set_volume(volume);
            report(root, result, "Volume");
        }
        KeyCode::Char('r') => {
            let result = root.playback_mut().cycle_playback_rate();
            report(root, result, "Speed change");
        }
        KeyCode::Char('l') => {
            let result = root.playback_mut().toggle_loop();
            report(root, result, "Loop toggle");
        }
        KeyCode::Char('a') => {
            root.playback_mut().toggle_autoplay();
            let state = if root.playback().state().is_autoplay {
                "on"
            } else {
                "off"
            };
            root.status = status_info(&format!("Auto-next {state}."));
        }
        KeyCode::Char('t') => root.transcript_mut().toggle(),
        KeyCode::PageDown => root.transcript_mut().scroll_by(5),
        KeyCode::PageUp => root.transcript_mut().scroll_by(-5),
        KeyCode::Char('v') => root.open_flashcards(),
        KeyCode::Char('?') => root.open_manual(),
        KeyCode::Char('s') => root.open_support(),
        KeyCode::Char('T') => root.cycle_theme(),
        KeyCode::Char('A') => root.enter_admin(),
        _ => {}
    }
    Flow::Continue
}

fn handle_admin_key(root: &mut Root, input: &mut InputMode, key: KeyEvent) -> Flow {
    if root.admin().editor.is_some() {
        match key.code {
            KeyCode::Enter => root.admin_save_edit(),
            KeyCode::Esc => root.admin_cancel_edit(),
            code => {
                if let Some(editor) = root.admin_editor_mut() {
                    match code {
                        KeyCode::Tab => editor.next_field(),
                        KeyCode::Backspace => editor.backspace(),
                        KeyCode::Char(ch) => editor.input(ch),
                        _ => {}
                    }
                }
            }
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc | KeyCode::Char('x') => root.exit_admin(),
        KeyCode::Up | KeyCode::Char('k') => root.admin_move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => root.admin_move_cursor(1),
        KeyCode::Enter | KeyCode::Char('e') => root.admin_begin_edit(),
        KeyCode::Char('w') => root.admin_save_to_file(),
        KeyCode::Char('P') => *input = InputMode::ChangePassword(PasswordForm::default()),
        KeyCode::Char('L') => *input = InputMode::SupportLink(root.support().link.clone()),
        KeyCode::Char('I') => *input = InputMode::SupportImage(String::new()),
        _ => {}
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::episode::load_episodes;
    use crate::app::playback::fake::FakeBackend;
    use crate::app::root::RootConfig;
    use crate::store::MemoryStore;
    use crossterm::event::KeyEvent;

    fn root() -> Root {
        Root::new(
            Box::new(MemoryStore::new()),
            Box::new(FakeBackend::default()),
            load_episodes(None).expect("episodes"),
            RootConfig {
                data_path: None,
                requested_id: None,
                visitor_log: None,
                download_path: std::env::temp_dir().join("podlearn-actions-export.json"),
                prefers_dark: true,
                fetch_remote: false,
            },
        )
    }

    fn press(root: &mut Root, input: &mut InputMode, code: KeyCode) -> Flow {
        handle_key(root, input, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn typing_search_filters_live_and_escape_clears() {
        let mut root = root();
        let mut input = InputMode::Normal;
        press(&mut root, &mut input, KeyCode::Char('/'));
        for ch in "travel".chars() {
            press(&mut root, &mut input, KeyCode::Char(ch));
        }
        assert_eq!(root.search(), "travel");
        assert_eq!(root.displayed().len(), 1);

        press(&mut root, &mut input, KeyCode::Esc);
        assert_eq!(input, InputMode::Normal);
        assert_eq!(root.search(), "");
    }

    #[test]
    fn letters_typed_into_search_are_not_commands() {
        let mut root = root();
        let mut input = InputMode::Search;
        assert_eq!(press(&mut root, &mut input, KeyCode::Char('q')), Flow::Continue);
        assert_eq!(root.search(), "q");
    }

    #[test]
    fn admin_login_flow_requires_password() {
        let mut root = root();
        let mut input = InputMode::Normal;
        press(&mut root, &mut input, KeyCode::Char('A'));
        assert_eq!(root.mode(), AppMode::Admin);

        input = InputMode::AdminLogin(String::new());
        for ch in "wrong".chars() {
            press(&mut root, &mut input, KeyCode::Char(ch));
        }
        press(&mut root, &mut input, KeyCode::Enter);
        assert!(!root.admin().authenticated);
        assert!(matches!(root.modal(), Some(Modal::Notice { .. })));

        press(&mut root, &mut input, KeyCode::Esc);
        assert!(root.modal().is_none());
        for ch in "admin123".chars() {
            press(&mut root, &mut input, KeyCode::Char(ch));
        }
        press(&mut root, &mut input, KeyCode::Enter);
        assert!(root.admin().authenticated);
        assert_eq!(input, InputMode::Normal);
    }

    #[test]
    fn flashcard_keys_drive_the_deck() {
        let mut root = root();
        let mut input = InputMode::Normal;
        press(&mut root, &mut input, KeyCode::Char('v'));
        press(&mut root, &mut input, KeyCode::Char(' '));
        match root.modal() {
            Some(Modal::Flashcards(deck)) => assert!(deck.is_flipped()),
            other => panic!("expected flashcards, got {other:?}"),
        }
        press(&mut root, &mut input, KeyCode::Esc);
        assert!(root.modal().is_none());
    }
}
