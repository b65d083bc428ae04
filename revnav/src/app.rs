//! Central application state for revnav.
//!
//! `AppState` owns the UI state: mode, focus, scroll offsets, the URL being typed,
//! the latest published snapshot and the emission log. It never mutates the change
//! view model directly. Keys map to [`ViewCommand`]s, which [`apply_command`] runs
//! against the model; the model's emissions come back as events and are recorded
//! with [`AppState::record_emission`].

use std::collections::VecDeque;
use std::sync::Arc;

use ratatui::layout::Rect;
use revnav_core::{
    codec, normalize_base_patch_num, parse_change_view_url, BasePatchSetNum, ChangeViewModel,
    ChangeViewState, ChildView, DiffView, EditView, RevisionPatchSetNum, Tab, ViewError,
};

/// Emissions kept in the log panel.
pub const EMISSION_LOG_CAPACITY: usize = 200;

/// File shown when switching to DIFF or EDIT without a file selected.
pub const COMMIT_MSG_PATH: &str = "/COMMIT_MSG";

/// Ticks (250 ms each) a status message stays visible.
const STATUS_TICKS: u8 = 20;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a URL after `:`.
    UrlInput,
    HelpOverlay,
}

/// Which panel currently has keyboard focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Left panel: fields of the current state.
    #[default]
    State,
    /// Centre panel: encoded URL and projections.
    Url,
    /// Right panel: emission log.
    Emissions,
}

impl PanelFocus {
    /// Cycle order: `State` → `Emissions` → `Url` → `State`.
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::State => PanelFocus::Emissions,
            PanelFocus::Url => PanelFocus::State,
            PanelFocus::Emissions => PanelFocus::Url,
        }
    }

    /// Cycle order: `State` → `Url` → `Emissions` → `State`.
    pub fn next(self) -> Self {
        match self {
            PanelFocus::State => PanelFocus::Url,
            PanelFocus::Url => PanelFocus::Emissions,
            PanelFocus::Emissions => PanelFocus::State,
        }
    }
}

/// A change to the view state requested from the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    ShowOverview,
    ShowDiff,
    ShowEdit,
    /// Files → Comments → Checks → Files. Plugin tabs go back to Files.
    CycleTab,
    NextPatchset,
    PrevPatchset,
    /// Moves the base one patchset up, as long as it stays older than the patchset.
    NextBase,
    ClearBase,
    ToggleCheckRun(String),
    OpenReplyDialog,
    Reload,
    Navigate(String),
}

/// One model publication, as shown in the emission log.
#[derive(Debug, Clone)]
pub struct Emission {
    /// 1-based publication counter.
    pub seq: u64,
    pub state: Option<Arc<ChangeViewState>>,
    /// Canonical URL of `state`.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    ticks_left: u8,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,
    /// Prefix the model's URLs are built under.
    pub base_url: String,

    /// Latest published snapshot, `None` before the first navigation and mid-reload.
    pub current: Option<Arc<ChangeViewState>>,
    /// Newest last, capped at [`EMISSION_LOG_CAPACITY`].
    pub emissions: VecDeque<Emission>,
    emission_seq: u64,

    /// Text typed after `:` in [`Mode::UrlInput`].
    pub url_input: String,
    pub status: Option<StatusMessage>,

    pub state_scroll: u16,
    pub url_scroll: u16,
    pub emissions_scroll: u16,
    pub help_scroll: u16,

    /// Outer rects of the three panels from the last render, for click-to-focus.
    pub panel_rects: [Rect; 3],
}

impl AppState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            base_url: base_url.into(),
            current: None,
            emissions: VecDeque::new(),
            emission_seq: 0,
            url_input: String::new(),
            status: None,
            state_scroll: 0,
            url_scroll: 0,
            emissions_scroll: 0,
            help_scroll: 0,
            panel_rects: [Rect::default(); 3],
        }
    }

    /// Records a publication of the change view model.
    pub fn record_emission(&mut self, state: Option<Arc<ChangeViewState>>) {
        self.emission_seq += 1;
        let url = state
            .as_deref()
            .map(|s| codec::create_change_view_url(&self.base_url, s));
        if self.emissions.len() == EMISSION_LOG_CAPACITY {
            self.emissions.pop_front();
        }
        self.emissions.push_back(Emission {
            seq: self.emission_seq,
            state: state.clone(),
            url,
        });
        self.current = state;
    }

    /// URL of the current state, if any.
    pub fn current_url(&self) -> Option<String> {
        self.emissions
            .back()
            .filter(|e| e.state.is_some())
            .and_then(|e| e.url.clone())
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            ticks_left: STATUS_TICKS,
        });
    }

    /// Ages the status message; called on every logic tick.
    pub fn tick(&mut self) {
        if let Some(status) = &mut self.status {
            status.ticks_left = status.ticks_left.saturating_sub(1);
            if status.ticks_left == 0 {
                self.status = None;
            }
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let offset = self.focused_scroll();
        *offset = offset.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        let offset = self.focused_scroll();
        *offset = offset.saturating_sub(lines);
    }

    pub fn scroll_top(&mut self) {
        *self.focused_scroll() = 0;
    }

    /// Scrolls past the end; the renderer clamps.
    pub fn scroll_bottom(&mut self) {
        *self.focused_scroll() = u16::MAX;
    }

    fn focused_scroll(&mut self) -> &mut u16 {
        match self.focus {
            PanelFocus::State => &mut self.state_scroll,
            PanelFocus::Url => &mut self.url_scroll,
            PanelFocus::Emissions => &mut self.emissions_scroll,
        }
    }
}

/// Runs `command` against the change view model.
///
/// # Errors
///
/// Returns [`ViewError::MissingRequiredState`] for commands that edit the current
/// state while there is none, and [`ViewError::MalformedViewUrl`] for a `Navigate`
/// URL that does not decode.
pub fn apply_command(model: &mut ChangeViewModel, command: ViewCommand) -> Result<(), ViewError> {
    tracing::debug!(?command, "applying view command");
    match command {
        ViewCommand::Navigate(url) => {
            let state = parse_change_view_url(&url, model.base_url())?;
            model.set_state(Some(state));
            Ok(())
        }
        ViewCommand::Reload => {
            model.reload();
            Ok(())
        }
        ViewCommand::ToggleCheckRun(name) => model.toggle_selected_check_run(&name),
        ViewCommand::OpenReplyDialog => model.update_state(|s| s.open_reply_dialog = true),
        ViewCommand::ShowOverview => model.update_state(|s| s.child_view = ChildView::Overview),
        ViewCommand::ShowDiff => model.update_state(|s| {
            let path = selected_path(&s.child_view);
            s.child_view = ChildView::Diff(DiffView::new(path));
            if s.patch_num == Some(RevisionPatchSetNum::Edit) {
                s.patch_num = None;
            }
        }),
        ViewCommand::ShowEdit => model.update_state(|s| {
            let path = selected_path(&s.child_view);
            s.child_view = ChildView::Edit(EditView::new(path));
            s.base_patch_num = None;
        }),
        ViewCommand::CycleTab => model.update_state(|s| {
            s.tab = Some(match s.resolved_tab() {
                Tab::Files => Tab::CommentThreads,
                Tab::CommentThreads => Tab::Checks,
                Tab::Checks | Tab::Plugin(_) => Tab::Files,
            });
        }),
        ViewCommand::NextPatchset => model.update_state(|s| {
            s.patch_num = Some(match s.patch_num {
                Some(RevisionPatchSetNum::Number(n)) => {
                    RevisionPatchSetNum::Number(n.saturating_add(1))
                }
                None | Some(RevisionPatchSetNum::Edit) => RevisionPatchSetNum::Number(1),
            });
        }),
        ViewCommand::PrevPatchset => model.update_state(|s| {
            if let Some(RevisionPatchSetNum::Number(n)) = s.patch_num {
                if n > 1 {
                    s.patch_num = Some(RevisionPatchSetNum::Number(n - 1));
                }
            }
            s.base_patch_num = normalize_base_patch_num(s.patch_num, s.base_patch_num);
        }),
        ViewCommand::NextBase => model.update_state(|s| {
            let next = match s.base_patch_num {
                Some(BasePatchSetNum::Number(n)) => BasePatchSetNum::Number(n.saturating_add(1)),
                None | Some(BasePatchSetNum::MergeParent(_)) => BasePatchSetNum::Number(1),
            };
            if let Some(base) = normalize_base_patch_num(s.patch_num, Some(next)) {
                s.base_patch_num = Some(base);
            }
        }),
        ViewCommand::ClearBase => model.update_state(|s| s.base_patch_num = None),
    }
}

/// The file of a DIFF or EDIT view, else the commit message.
fn selected_path(child_view: &ChildView) -> String {
    match child_view {
        ChildView::Diff(diff) => diff.path.clone(),
        ChildView::Edit(edit) => edit.path.clone(),
        ChildView::Overview => COMMIT_MSG_PATH.to_owned(),
    }
}
