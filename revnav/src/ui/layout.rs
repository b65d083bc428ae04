//! Responsive 3-panel layout for revnav.
//!
//! Pure layout arithmetic, recomputed on every render so each frame reflects the
//! current terminal size.
//!
//! At `>= 120` columns the state, URL and emission panels share the width 30 / 40 / 30.
//! Below that the emission panel collapses and the other two split 45 / 55.
//!
//! `Spacing::Overlap(1)` together with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panels share a single border column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[state, url, emissions, status_bar]` rects for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let horizontal = if term_width >= 120 {
        Layout::horizontal([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .spacing(Spacing::Overlap(1))
    } else {
        Layout::horizontal([
            Constraint::Percentage(45),
            Constraint::Fill(1),
            Constraint::Length(0),
        ])
        .spacing(Spacing::Overlap(1))
    };

    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// The inner `Rect` of a panel after removing its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// Focused panels get a thick border in `border_active`. `MergeStrategy::Fuzzy` is
/// needed because `Exact` draws wrong junctions between thick and plain borders.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Clamps a scroll offset so the last line stays at the bottom of the viewport.
pub fn clamp_scroll(offset: u16, content_lines: usize, viewport_height: u16) -> u16 {
    let max = content_lines.saturating_sub(usize::from(viewport_height));
    offset.min(u16::try_from(max).unwrap_or(u16::MAX))
}

/// Renders the 1-row status bar.
///
/// Shows the mode indicator, then either the URL being typed, the latest status
/// message, or a short key hint.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::UrlInput => (" URL ", theme.status_mode_input),
        Mode::HelpOverlay => (" HELP ", theme.status_mode_normal),
        Mode::Normal => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ];
    match (&state.mode, &state.status) {
        (Mode::UrlInput, _) => {
            spans.push(Span::raw(format!(":{}", state.url_input)));
            spans.push(Span::styled("█", Style::default().fg(mode_fg)));
        }
        (_, Some(status)) => {
            let fg = if status.is_error { theme.status_error } else { theme.status_bar_fg };
            spans.push(Span::styled(status.text.as_str(), Style::default().fg(fg)));
        }
        (_, None) => spans.push(Span::raw(": enter url   R reload   ? help   q quit")),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
