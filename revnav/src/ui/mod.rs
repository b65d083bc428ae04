//! UI rendering for revnav.
//!
//! [`render`] is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each panel
//! has its own module.

pub mod emissions;
pub mod help;
pub mod keybindings;
mod layout;
pub mod state_panel;
pub mod url_panel;

use ratatui::{Frame, style::Style, widgets::Block};
use revnav_core::ChangeViewModel;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar};

/// Renders one complete frame: the three panels, the status bar and, in help mode,
/// the overlay on top.
///
/// Panel rects are written back into `state` so the next mouse click can be mapped
/// to a panel.
pub fn render(frame: &mut Frame, state: &mut AppState, model: &ChangeViewModel, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame);
    state.panel_rects = [left, center, right];

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        frame.area(),
    );

    state_panel::render_state_panel(frame, left, state, theme);
    url_panel::render_url_panel(frame, center, state, model, theme);
    if right.width > 0 {
        emissions::render_emissions(frame, right, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
