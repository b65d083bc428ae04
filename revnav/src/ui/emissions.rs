//! Right panel: every publication of the change view model, newest at the bottom.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Emission, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{clamp_scroll, inner_rect, panel_block};

/// One-line summary of an emission: `#seq EMPTY` or `#seq KIND url`.
pub fn emission_summary(emission: &Emission) -> String {
    match (&emission.state, &emission.url) {
        (Some(state), Some(url)) => format!("#{} {} {url}", emission.seq, state.child_view_kind()),
        _ => format!("#{} EMPTY", emission.seq),
    }
}

pub fn render_emissions(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block("Emissions", state.focus == PanelFocus::Emissions, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = state
        .emissions
        .iter()
        .map(|emission| {
            let fg = if emission.state.is_some() {
                theme.emission_state
            } else {
                theme.emission_empty
            };
            Line::from(Span::styled(emission_summary(emission), Style::default().fg(fg)))
        })
        .collect();

    let scroll = clamp_scroll(state.emissions_scroll, lines.len(), inner.height);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use revnav_core::parse_change_view_url;

    #[test]
    fn summaries_name_the_child_view() {
        let mut app = AppState::new("");
        app.record_emission(None);
        app.record_emission(Some(Arc::new(
            parse_change_view_url("/c/4/1/a.txt", "").unwrap(),
        )));
        let lines: Vec<_> = app.emissions.iter().map(emission_summary).collect();
        assert_eq!(lines, vec!["#1 EMPTY", "#2 DIFF /c/4/1/a.txt"]);
    }
}
