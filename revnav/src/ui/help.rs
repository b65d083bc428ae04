//! Help overlay: a centred modal drawn over the panels.
//!
//! `Clear` erases the area first so the overlay renders inside the same
//! `terminal.draw()` closure as everything else.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay, scrolled by `help_scroll` rows.
///
/// Skipped on terminals narrower than 60 columns, where the centred rect would be
/// too small to hold any text.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help: j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text(theme: &Theme) -> Text<'static> {
    let heading = |text: &'static str| {
        Line::styled(
            text,
            Style::default().fg(theme.field_label).add_modifier(Modifier::BOLD),
        )
    };
    Text::from(vec![
        heading("Panels"),
        Line::from("  j / k         Scroll the focused panel"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  H / L         Move panel focus left / right"),
        Line::from(""),
        heading("Location"),
        Line::from("  :             Enter a change URL, Enter to open, Esc to cancel"),
        Line::from("  o / d / e     Show overview / diff / edit"),
        Line::from("  t             Cycle overview tab"),
        Line::from("  p / P         Next / previous patchset"),
        Line::from("  b / B         Next base patchset / compare against parent"),
        Line::from("  1-9           Toggle selection of check run run-N"),
        Line::from(""),
        heading("One-shot"),
        Line::from("  r             Open the reply dialog"),
        Line::from("  R             Reload the change (publishes empty, then the state)"),
        Line::from(""),
        heading("General"),
        Line::from("  ?             Toggle this help"),
        Line::from("  q / Esc       Quit and print the current URL"),
    ])
}
