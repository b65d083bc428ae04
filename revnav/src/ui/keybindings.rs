//! Keybinding dispatcher for revnav.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop what to do next. The dispatcher branches
//! first on `state.mode` so Normal, UrlInput and HelpOverlay have isolated
//! handlers. Nothing here touches the change view model: changes to the view
//! state leave as [`KeyAction::Command`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus, ViewCommand};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing for the event loop to do beyond the next render.
    Continue,
    /// Run a command against the change view model.
    Command(ViewCommand),
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// # Arguments
///
/// * `key`: the raw crossterm key event (code + modifiers)
/// * `state`: mutable reference to all UI state
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::UrlInput => handle_url_input(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    if let Some(command) = view_command_for(key) {
        return KeyAction::Command(command);
    }

    match key.code {
        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }

        KeyCode::Char(':') => {
            state.url_input.clear();
            state.mode = Mode::UrlInput;
            KeyAction::Continue
        }

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,

        _ => KeyAction::Continue,
    }
}

/// Keys that edit the view state. `Ctrl` combinations are left to other handlers.
fn view_command_for(key: KeyEvent) -> Option<ViewCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let command = match key.code {
        KeyCode::Char('o') => ViewCommand::ShowOverview,
        KeyCode::Char('d') => ViewCommand::ShowDiff,
        KeyCode::Char('e') => ViewCommand::ShowEdit,
        KeyCode::Char('t') => ViewCommand::CycleTab,
        KeyCode::Char('p') => ViewCommand::NextPatchset,
        KeyCode::Char('P') => ViewCommand::PrevPatchset,
        KeyCode::Char('b') => ViewCommand::NextBase,
        KeyCode::Char('B') => ViewCommand::ClearBase,
        KeyCode::Char('r') => ViewCommand::OpenReplyDialog,
        KeyCode::Char('R') => ViewCommand::Reload,
        KeyCode::Char(c @ '1'..='9') => ViewCommand::ToggleCheckRun(format!("run-{c}")),
        _ => return None,
    };
    Some(command)
}

/// Handles scroll keys in Normal mode: j / k / g / G.
///
/// Returns `None` when the key should fall through to the rest of the Normal handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// UrlInput mode
// ---------------------------------------------------------------------------

/// Edits `state.url_input`. `Enter` submits a non-empty URL, `Esc` abandons it.
fn handle_url_input(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            let url = std::mem::take(&mut state.url_input);
            let url = url.trim();
            if url.is_empty() {
                KeyAction::Continue
            } else {
                KeyAction::Command(ViewCommand::Navigate(url.to_owned()))
            }
        }
        KeyCode::Esc => {
            state.url_input.clear();
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            state.url_input.pop();
            KeyAction::Continue
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.url_input.clear();
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            state.url_input.push(c);
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// `?`, `Esc` or `q` dismisses the overlay; j / k / g / G scroll it.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('G') => state.help_scroll = u16::MAX,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// The wheel scrolls the focused panel (or the help overlay) by 3 lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            focus_at(Position { x: mouse.column, y: mouse.row }, state);
        }
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}

/// Focuses the panel under `pos`. Collapsed panels cannot receive focus.
fn focus_at(pos: Position, state: &mut AppState) {
    let [left, center, right] = state.panel_rects;
    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::State;
    } else if center.width > 0 && center.contains(pos) {
        state.focus = PanelFocus::Url;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Emissions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            assert_eq!(handle_key(press(KeyCode::Char(c)), state), KeyAction::Continue);
        }
    }

    #[test]
    fn view_keys_map_to_commands() {
        let mut state = AppState::new("");
        assert_eq!(
            handle_key(press(KeyCode::Char('d')), &mut state),
            KeyAction::Command(ViewCommand::ShowDiff)
        );
        assert_eq!(
            handle_key(press(KeyCode::Char('3')), &mut state),
            KeyAction::Command(ViewCommand::ToggleCheckRun("run-3".to_owned()))
        );
        assert_eq!(
            handle_key(press(KeyCode::Char('R')), &mut state),
            KeyAction::Command(ViewCommand::Reload)
        );
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn url_entry_submits_on_enter() {
        let mut state = AppState::new("");
        handle_key(press(KeyCode::Char(':')), &mut state);
        assert_eq!(state.mode, Mode::UrlInput);

        // View keys are plain text while typing.
        type_str(&mut state, "/c/42/dx");
        handle_key(press(KeyCode::Backspace), &mut state);
        assert_eq!(state.url_input, "/c/42/d");

        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            KeyAction::Command(ViewCommand::Navigate("/c/42/d".to_owned()))
        );
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.url_input.is_empty());
    }

    #[test]
    fn url_entry_escape_and_empty_submit() {
        let mut state = AppState::new("");
        handle_key(press(KeyCode::Char(':')), &mut state);
        type_str(&mut state, "/c/1");
        assert_eq!(handle_key(press(KeyCode::Esc), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);

        handle_key(press(KeyCode::Char(':')), &mut state);
        type_str(&mut state, "  ");
        assert_eq!(handle_key(press(KeyCode::Enter), &mut state), KeyAction::Continue);
    }

    #[test]
    fn help_overlay_swallows_view_keys() {
        let mut state = AppState::new("");
        handle_key(press(KeyCode::Char('?')), &mut state);
        assert_eq!(handle_key(press(KeyCode::Char('d')), &mut state), KeyAction::Continue);
        handle_key(press(KeyCode::Char('j')), &mut state);
        assert_eq!(state.help_scroll, 1);
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn focus_cycles_and_follows_clicks() {
        let mut state = AppState::new("");
        handle_key(press(KeyCode::Char('L')), &mut state);
        assert_eq!(state.focus, PanelFocus::Url);
        handle_key(press(KeyCode::Char('H')), &mut state);
        handle_key(press(KeyCode::Char('H')), &mut state);
        assert_eq!(state.focus, PanelFocus::Emissions);

        state.panel_rects = [
            Rect::new(0, 0, 40, 20),
            Rect::new(39, 0, 40, 20),
            Rect::new(0, 0, 0, 0),
        ];
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(click, &mut state);
        assert_eq!(state.focus, PanelFocus::State);
    }
}
