//! Centre panel: the canonical URL of the current state, derived link URLs and the
//! model's projections.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use revnav_core::{
    ChangeViewModel, DiffUrlOverride, DiffView, EditUrlOverride, EditView, create_change_url,
    create_change_view_url,
};

use crate::app::{AppState, COMMIT_MSG_PATH, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{clamp_scroll, inner_rect, panel_block};

/// A labelled URL; `Err` carries the reason it cannot be built.
pub type UrlRow = (&'static str, Result<String, String>);

/// The URLs shown in the panel. Empty when the model has no state.
pub fn url_rows(model: &ChangeViewModel) -> Vec<UrlRow> {
    let Some(state) = model.get_state() else {
        return Vec::new();
    };
    let base = model.base_url();

    // Link previews fall back to the commit message when no file is open.
    let diff_path = model
        .diff_path()
        .or_else(|| model.edit_path())
        .unwrap_or_else(|| COMMIT_MSG_PATH.to_owned());
    let diff = model
        .diff_url(DiffUrlOverride {
            diff_view: Some(DiffView::new(diff_path.clone())),
            ..DiffUrlOverride::default()
        })
        .map_err(|e| e.to_string());
    let edit = model
        .edit_url(EditUrlOverride {
            edit_view: Some(EditView::new(diff_path)),
            ..EditUrlOverride::default()
        })
        .map_err(|e| e.to_string());

    vec![
        ("view", Ok(create_change_view_url(base, &state))),
        ("change", Ok(create_change_url(base, &state))),
        ("diff link", diff),
        ("edit link", edit),
    ]
}

/// Resolved projections, as `(label, value)`.
pub fn projection_rows(model: &ChangeViewModel) -> Vec<(&'static str, String)> {
    if model.get_state().is_none() {
        return Vec::new();
    }
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_owned());
    vec![
        ("tab", model.tab().to_string()),
        ("checks patchset", opt(model.checks_patchset().map(|n| n.to_string()))),
        ("attempt", opt(model.attempt().map(|a| a.to_string()))),
        ("results filter", model.checks_results_filter()),
    ]
}

pub fn render_url_panel(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    model: &ChangeViewModel,
    theme: &Theme,
) {
    let block = panel_block("URL", state.focus == PanelFocus::Url, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let label_style = Style::default().fg(theme.field_label);
    let mut lines: Vec<Line> = Vec::new();

    let rows = url_rows(model);
    if rows.is_empty() {
        lines.push(Line::styled("(no state)", Style::default().fg(theme.field_unset)));
    }
    for (label, url) in rows {
        lines.push(Line::styled(label, label_style.add_modifier(Modifier::BOLD)));
        lines.push(match url {
            Ok(url) => Line::styled(format!("  {url}"), Style::default().fg(theme.url)),
            Err(reason) => Line::styled(format!("  {reason}"), Style::default().fg(theme.status_error)),
        });
    }

    let projections = projection_rows(model);
    if !projections.is_empty() {
        lines.push(Line::raw(""));
        for (label, value) in projections {
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<16}"), label_style),
                Span::styled(value, Style::default().fg(theme.field_value)),
            ]));
        }
    }

    let scroll = clamp_scroll(state.url_scroll, lines.len(), inner.height);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        inner,
    );
}
