//! Left panel: every field of the current change view state.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use revnav_core::{ChangeViewState, ChildView};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{clamp_scroll, inner_rect, panel_block};

/// One rendered field: label, value (`None` when unset) and whether it is a one-shot flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub label: &'static str,
    pub value: Option<String>,
    pub one_shot: bool,
}

impl FieldRow {
    fn new(label: &'static str, value: Option<String>) -> Self {
        Self { label, value, one_shot: false }
    }

    fn flag(label: &'static str, set: bool) -> Self {
        Self {
            label,
            value: set.then(|| "true".to_owned()),
            one_shot: true,
        }
    }
}

fn show<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(ToString::to_string)
}

/// Flattens `state` into display rows, child view payload first.
pub fn field_rows(state: &ChangeViewState) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("change", Some(state.change_num.to_string())),
        FieldRow::new("repo", state.repo.clone()),
        FieldRow::new("child view", Some(state.child_view_kind().to_string())),
    ];
    match &state.child_view {
        ChildView::Overview => {}
        ChildView::Diff(diff) => {
            rows.push(FieldRow::new("  path", Some(diff.path.clone())));
            rows.push(FieldRow::new("  line", show(&diff.line_num)));
            rows.push(FieldRow::new("  left side", Some(diff.left_side.to_string())));
        }
        ChildView::Edit(edit) => {
            rows.push(FieldRow::new("  path", Some(edit.path.clone())));
            rows.push(FieldRow::new("  line", show(&edit.line_num)));
        }
    }

    let runs = (!state.checks_runs_selected.is_empty()).then(|| {
        state
            .checks_runs_selected
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    });

    rows.extend([
        FieldRow::new("patchset", show(&state.patch_num)),
        FieldRow::new("base", show(&state.base_patch_num)),
        FieldRow::new("comment", state.comment_id.clone()),
        FieldRow::new("edit", Some(state.edit.to_string())),
        FieldRow::new("tab", show(&state.tab)),
        FieldRow::new("checks patchset", show(&state.checks_patchset)),
        FieldRow::new("attempt", show(&state.attempt)),
        FieldRow::new("filter", state.filter.clone()),
        FieldRow::new("runs selected", runs),
        FieldRow::new("results filter", state.checks_results_filter.clone()),
        FieldRow::new("message hash", state.message_hash.clone()),
        FieldRow::flag("force reload", state.force_reload),
        FieldRow::flag("open reply", state.open_reply_dialog),
        FieldRow {
            label: "usp",
            value: state.usp.clone(),
            one_shot: true,
        },
    ]);
    rows
}

const LABEL_WIDTH: usize = 16;

pub fn render_state_panel(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block("View state", state.focus == PanelFocus::State, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(current) = state.current.as_deref() else {
        let msg = Line::styled(
            "  (empty) press : to enter a change url",
            Style::default().fg(theme.field_unset),
        );
        frame.render_widget(Paragraph::new(msg), inner);
        return;
    };

    let label_style = Style::default().fg(theme.field_label);
    let lines: Vec<Line> = field_rows(current)
        .into_iter()
        .map(|row| {
            let value = match (&row.value, row.one_shot) {
                (Some(v), true) => Span::styled(
                    v.clone(),
                    Style::default().fg(theme.one_shot).add_modifier(Modifier::BOLD),
                ),
                (Some(v), false) => Span::styled(v.clone(), Style::default().fg(theme.field_value)),
                (None, _) => Span::styled("-", Style::default().fg(theme.field_unset)),
            };
            Line::from(vec![
                Span::styled(format!("{:<LABEL_WIDTH$}", row.label), label_style),
                value,
            ])
        })
        .collect();

    let scroll = clamp_scroll(state.state_scroll, lines.len(), inner.height);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use revnav_core::parse_change_view_url;

    fn value_of(rows: &[FieldRow], label: &str) -> Option<String> {
        rows.iter().find(|r| r.label == label).and_then(|r| r.value.clone())
    }

    #[test]
    fn diff_rows_include_payload() {
        let state = parse_change_view_url("/c/r/+/9/1..3/lib.rs#b4", "").unwrap();
        let rows = field_rows(&state);
        assert_eq!(value_of(&rows, "child view").as_deref(), Some("DIFF"));
        assert_eq!(value_of(&rows, "  path").as_deref(), Some("lib.rs"));
        assert_eq!(value_of(&rows, "  left side").as_deref(), Some("true"));
        assert_eq!(value_of(&rows, "base").as_deref(), Some("1"));
        assert_eq!(value_of(&rows, "force reload"), None);
    }

    #[test]
    fn overview_rows_show_runs_and_flags() {
        let state =
            parse_change_view_url("/c/9?checksRunsSelected=b,a&openReplyDialog=true", "").unwrap();
        let rows = field_rows(&state);
        assert_eq!(value_of(&rows, "runs selected").as_deref(), Some("a, b"));
        let open_reply = rows.iter().find(|r| r.label == "open reply").unwrap();
        assert!(open_reply.one_shot);
        assert_eq!(open_reply.value.as_deref(), Some("true"));
        assert!(!rows.iter().any(|r| r.label == "  path"));
    }
}
