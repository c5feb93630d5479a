//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Keys that only move focus
//! or edit the form mutate [`App`] directly; keys that touch the backend come
//! back as a [`Command`] for the main loop to dispatch, since only it owns
//! the session controller.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. If it talks to the backend, add a [`Command`] variant and handle it in
//!    [`App::dispatch`](crate::app::App::dispatch).
//! 2. Add a match arm in [`handle_key_event`] (global chords) or in the
//!    focus-specific helper.
//! 3. Update the hint text in [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Focus};
use crate::form::Field;

/// Something the session or catalog has to do in response to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a session, or refresh the running one.
    Submit,
    Refresh,
    Truncate,
    Dispose,
    ReloadCatalog,
    SetRefreshInterval(u64),
}

/// Process a single key event.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                app.quit = true;
                None
            }
            KeyCode::Char('r') => Some(Command::Refresh),
            KeyCode::Char('t') => Some(Command::Truncate),
            KeyCode::Char('d') => Some(Command::Dispose),
            KeyCode::Char('l') => Some(Command::ReloadCatalog),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => {
            app.quit = true;
            None
        }
        KeyCode::F(5) => Some(Command::Refresh),
        KeyCode::Tab => {
            app.focus_next();
            None
        }
        KeyCode::BackTab => {
            app.focus_previous();
            None
        }
        KeyCode::Enter => Some(Command::Submit),
        _ => match app.focus {
            Focus::Field(field) => field_key(app, field, key.code),
            Focus::Messages => {
                messages_key(app, key.code);
                None
            }
        },
    }
}

fn field_key(app: &mut App, field: Field, code: KeyCode) -> Option<Command> {
    let form = &mut app.form;
    match (field, code) {
        (Field::RefreshRate, KeyCode::Left | KeyCode::Char('-')) => {
            form.cycle_refresh(-1).map(Command::SetRefreshInterval)
        }
        (Field::RefreshRate, KeyCode::Right | KeyCode::Char('+')) => {
            form.cycle_refresh(1).map(Command::SetRefreshInterval)
        }
        (Field::Deserializer, KeyCode::Left | KeyCode::Up) => {
            form.cycle_deserializer(-1);
            None
        }
        (Field::Deserializer, KeyCode::Right | KeyCode::Down) => {
            form.cycle_deserializer(1);
            None
        }
        (Field::Topic, KeyCode::Up) => {
            form.cycle_topic(-1);
            None
        }
        (Field::Topic, KeyCode::Down) => {
            form.cycle_topic(1);
            None
        }
        (_, KeyCode::Char(c)) => {
            form.insert_char(field, c);
            None
        }
        (_, KeyCode::Backspace) => {
            form.backspace(field);
            None
        }
        _ => None,
    }
}

fn messages_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        _ => {}
    }
}
