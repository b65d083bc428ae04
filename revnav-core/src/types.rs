//! Typed change view state.
//!
//! `ChangeViewState` describes "where the user is" inside a change: which change,
//! which patch range, which child view, and the overview/checks sub-state. All
//! types here are plain owned values so published snapshots can be shared behind
//! an `Arc` without borrowing.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Positive numeric change identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericChangeId(NonZeroU32);

impl NumericChangeId {
    /// Returns `None` for zero, which never identifies a change.
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for NumericChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal used in URLs for the change edit revision.
pub const EDIT: &str = "edit";

/// A revision that can be shown on the right side of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionPatchSetNum {
    /// A numbered patchset.
    Number(u32),
    /// The change edit sentinel (written `edit`).
    Edit,
}

impl RevisionPatchSetNum {
    /// The numeric value, or `None` for the edit sentinel.
    pub fn number(self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(n),
            Self::Edit => None,
        }
    }
}

impl fmt::Display for RevisionPatchSetNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Edit => f.write_str(EDIT),
        }
    }
}

impl FromStr for RevisionPatchSetNum {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EDIT {
            return Ok(Self::Edit);
        }
        s.parse().map(Self::Number)
    }
}

/// A revision that can be shown on the left side of a diff.
///
/// "Parent" has no variant: an absent base already means the parent commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasePatchSetNum {
    /// A numbered patchset.
    Number(u32),
    /// The n-th parent of a merge commit (written `-n`).
    MergeParent(u32),
}

impl fmt::Display for BasePatchSetNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::MergeParent(n) => write!(f, "-{n}"),
        }
    }
}

impl FromStr for BasePatchSetNum {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(parent) => parent.parse().map(Self::MergeParent),
            None => s.parse().map(Self::Number),
        }
    }
}

/// Drops a base that is not strictly older than the revision it is compared to.
///
/// Only numeric pairs are checked. `patch 3` against `base 5` (or `base 3`) is not a
/// meaningful range, so the base falls back to the parent.
pub fn normalize_base_patch_num(
    patch_num: Option<RevisionPatchSetNum>,
    base_patch_num: Option<BasePatchSetNum>,
) -> Option<BasePatchSetNum> {
    match (patch_num, base_patch_num) {
        (Some(RevisionPatchSetNum::Number(patch)), Some(BasePatchSetNum::Number(base)))
            if patch <= base =>
        {
            None
        }
        (_, base) => base,
    }
}

/// Rendering mode of the change page, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeChildView {
    Overview,
    Diff,
    Edit,
}

impl ChangeChildView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "OVERVIEW",
            Self::Diff => "DIFF",
            Self::Edit => "EDIT",
        }
    }
}

impl fmt::Display for ChangeChildView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties of the DIFF child view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffView {
    /// File path. Empty means the whole change (magic path handling is up to the caller).
    pub path: String,
    pub line_num: Option<u32>,
    /// `true` when `line_num` refers to the base (left) side.
    pub left_side: bool,
}

impl DiffView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Properties of the EDIT child view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditView {
    pub path: String,
    pub line_num: Option<u32>,
}

impl EditView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line_num: None,
        }
    }
}

/// Mutually exclusive rendering modes. DIFF and EDIT always carry a file path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildView {
    #[default]
    Overview,
    Diff(DiffView),
    Edit(EditView),
}

impl ChildView {
    pub fn kind(&self) -> ChangeChildView {
        match self {
            Self::Overview => ChangeChildView::Overview,
            Self::Diff(_) => ChangeChildView::Diff,
            Self::Edit(_) => ChangeChildView::Edit,
        }
    }
}

/// Sub-tab of the OVERVIEW child view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tab {
    Files,
    CommentThreads,
    Checks,
    /// A tab contributed by a plugin, identified by its name.
    Plugin(String),
}

impl Tab {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Files => "files",
            Self::CommentThreads => "comments",
            Self::Checks => "checks",
            Self::Plugin(name) => name,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Tab {
    fn from(s: &str) -> Self {
        match s {
            "files" => Self::Files,
            "comments" => Self::CommentThreads,
            "checks" => Self::Checks,
            other => Self::Plugin(other.to_owned()),
        }
    }
}

/// Which attempt of the check runs to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttemptChoice {
    #[default]
    Latest,
    All,
    Number(u32),
}

impl fmt::Display for AttemptChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::All => f.write_str("all"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for AttemptChoice {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "all" => Ok(Self::All),
            n => n.parse().map(Self::Number),
        }
    }
}

/// Full view state of the change page.
///
/// Fields from `edit` through `message_hash` only apply to the OVERVIEW child view;
/// `checks_patchset` also applies to DIFF. The one-shot flags at the end are cleared
/// by the model right after the state carrying them has been published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeViewState {
    pub change_num: NumericChangeId,
    pub repo: Option<String>,
    pub child_view: ChildView,
    /// `None` means "latest".
    pub patch_num: Option<RevisionPatchSetNum>,
    /// `None` means "parent".
    pub base_patch_num: Option<BasePatchSetNum>,
    pub comment_id: Option<String>,

    pub edit: bool,
    pub tab: Option<Tab>,
    /// Patchset selected for check runs. `None` follows `patch_num`.
    pub checks_patchset: Option<u32>,
    /// Regular expression for filtering check runs.
    pub filter: Option<String>,
    pub attempt: Option<AttemptChoice>,
    pub checks_runs_selected: BTreeSet<String>,
    /// Regular expression for filtering check results.
    pub checks_results_filter: Option<String>,
    /// Change log message anchor. The encoder adds the leading `#` when it is missing.
    pub message_hash: Option<String>,

    pub usp: Option<String>,
    pub force_reload: bool,
    pub open_reply_dialog: bool,
}

impl ChangeViewState {
    /// A state for `change_num` in `child_view` with every optional field unset.
    pub fn new(change_num: NumericChangeId, child_view: ChildView) -> Self {
        Self {
            change_num,
            repo: None,
            child_view,
            patch_num: None,
            base_patch_num: None,
            comment_id: None,
            edit: false,
            tab: None,
            checks_patchset: None,
            filter: None,
            attempt: None,
            checks_runs_selected: BTreeSet::new(),
            checks_results_filter: None,
            message_hash: None,
            usp: None,
            force_reload: false,
            open_reply_dialog: false,
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_patch_num(mut self, patch_num: RevisionPatchSetNum) -> Self {
        self.patch_num = Some(patch_num);
        self
    }

    pub fn child_view_kind(&self) -> ChangeChildView {
        self.child_view.kind()
    }

    /// Explicit tab, else the comments tab when a comment is targeted, else files.
    pub fn resolved_tab(&self) -> Tab {
        match (&self.tab, &self.comment_id) {
            (Some(tab), _) => tab.clone(),
            (None, Some(_)) => Tab::CommentThreads,
            (None, None) => Tab::Files,
        }
    }

    /// Patchset the checks view should show: the explicit choice, else the numeric
    /// `patch_num`. The edit sentinel has no check runs.
    pub fn resolved_checks_patchset(&self) -> Option<u32> {
        match self.checks_patchset {
            Some(ps) => Some(ps),
            None => self.patch_num.and_then(RevisionPatchSetNum::number),
        }
    }

    /// `true` when `checks_patchset` only repeats `patch_num` (or is zero).
    pub fn checks_patchset_is_redundant(&self) -> bool {
        match self.checks_patchset {
            Some(0) => true,
            Some(ps) => self.patch_num == Some(RevisionPatchSetNum::Number(ps)),
            None => false,
        }
    }

    pub fn has_one_shot_flags(&self) -> bool {
        self.usp.is_some() || self.force_reload || self.open_reply_dialog
    }

    pub fn clear_one_shot_flags(&mut self) {
        self.usp = None;
        self.force_reload = false;
        self.open_reply_dialog = false;
    }

    /// Returns the state as it reads back after a trip through the URL codec.
    ///
    /// Drops everything the encoder cannot express for the current child view and
    /// folds default values into "unset".
    pub fn normalized(&self) -> Self {
        let mut s = self.clone();
        s.repo = non_empty(s.repo);
        s.comment_id = non_empty(s.comment_id);
        if s.patch_num.is_none() {
            s.base_patch_num = None;
        }
        if s.checks_patchset_is_redundant() {
            s.checks_patchset = None;
        }

        if s.child_view == ChildView::Overview {
            s.filter = non_empty(s.filter);
            s.checks_results_filter = non_empty(s.checks_results_filter);
            s.message_hash = non_empty(s.message_hash).map(|hash| {
                if hash.starts_with('#') {
                    hash
                } else {
                    format!("#{hash}")
                }
            });
            s.usp = non_empty(s.usp);
            s.checks_runs_selected.retain(|name| !name.is_empty());
            if s.attempt == Some(AttemptChoice::Latest) {
                s.attempt = None;
            }
            s.tab = s
                .tab
                .map(|tab| Tab::from(tab.as_str()))
                .filter(|tab| *tab != Tab::Files && !tab.as_str().is_empty());
            return s;
        }

        match &mut s.child_view {
            ChildView::Overview => {}
            ChildView::Diff(diff) => {
                if diff.line_num == Some(0) {
                    diff.line_num = None;
                }
                if diff.line_num.is_none() {
                    diff.left_side = false;
                }
            }
            ChildView::Edit(edit) => {
                if edit.line_num == Some(0) {
                    edit.line_num = None;
                }
                if s.patch_num.is_none() {
                    s.patch_num = Some(RevisionPatchSetNum::Edit);
                }
                s.base_patch_num = None;
                s.comment_id = None;
                s.checks_patchset = None;
            }
        }

        s.clear_overview_only();
        s
    }

    fn clear_overview_only(&mut self) {
        self.edit = false;
        self.tab = None;
        self.filter = None;
        self.attempt = None;
        self.checks_runs_selected.clear();
        self.checks_results_filter = None;
        self.message_hash = None;
        self.clear_one_shot_flags();
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(n: u32) -> NumericChangeId {
        NumericChangeId::new(n).unwrap()
    }

    #[test]
    fn zero_is_not_a_change_id() {
        assert!(NumericChangeId::new(0).is_none());
        assert_eq!(change(42).to_string(), "42");
    }

    #[test]
    fn base_patch_num_parses_merge_parents() {
        assert_eq!("-1".parse(), Ok(BasePatchSetNum::MergeParent(1)));
        assert_eq!("4".parse(), Ok(BasePatchSetNum::Number(4)));
        assert_eq!(BasePatchSetNum::MergeParent(2).to_string(), "-2");
        assert!("x".parse::<BasePatchSetNum>().is_err());
    }

    #[test]
    fn base_not_older_than_patch_is_dropped() {
        use BasePatchSetNum as B;
        use RevisionPatchSetNum as R;
        assert_eq!(normalize_base_patch_num(Some(R::Number(3)), Some(B::Number(5))), None);
        assert_eq!(normalize_base_patch_num(Some(R::Number(3)), Some(B::Number(3))), None);
        assert_eq!(
            normalize_base_patch_num(Some(R::Number(3)), Some(B::Number(2))),
            Some(B::Number(2))
        );
        assert_eq!(
            normalize_base_patch_num(Some(R::Number(3)), Some(B::MergeParent(1))),
            Some(B::MergeParent(1))
        );
        assert_eq!(
            normalize_base_patch_num(Some(R::Edit), Some(B::Number(9))),
            Some(B::Number(9))
        );
    }

    #[test]
    fn resolved_tab_prefers_comments_when_comment_targeted() {
        let mut s = ChangeViewState::new(change(1), ChildView::Overview);
        assert_eq!(s.resolved_tab(), Tab::Files);
        s.comment_id = Some("c1".to_owned());
        assert_eq!(s.resolved_tab(), Tab::CommentThreads);
        s.tab = Some(Tab::Checks);
        assert_eq!(s.resolved_tab(), Tab::Checks);
    }

    #[test]
    fn checks_patchset_follows_numeric_patch_only() {
        let mut s = ChangeViewState::new(change(1), ChildView::Overview)
            .with_patch_num(RevisionPatchSetNum::Number(4));
        assert_eq!(s.resolved_checks_patchset(), Some(4));
        s.patch_num = Some(RevisionPatchSetNum::Edit);
        assert_eq!(s.resolved_checks_patchset(), None);
        s.checks_patchset = Some(2);
        assert_eq!(s.resolved_checks_patchset(), Some(2));
    }

    #[test]
    fn normalized_edit_view_defaults_to_edit_revision() {
        let mut s = ChangeViewState::new(change(7), ChildView::Edit(EditView::new("x.txt")));
        s.base_patch_num = Some(BasePatchSetNum::Number(1));
        s.tab = Some(Tab::Checks);
        s.open_reply_dialog = true;
        let n = s.normalized();
        assert_eq!(n.patch_num, Some(RevisionPatchSetNum::Edit));
        assert_eq!(n.base_patch_num, None);
        assert_eq!(n.tab, None);
        assert!(!n.open_reply_dialog);
    }
}
