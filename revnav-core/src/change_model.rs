//! The change view model: the store behind the change page.
//!
//! Wraps a [`Model<ChangeViewState>`] with the change page's publication rules:
//!
//! - **Reload.** A state carrying `force_reload` is not published directly. The model
//!   publishes `None` first so every dependent view tears down, and queues the target
//!   state (with `force_reload` cleared) as deferred work. The host event loop calls
//!   [`ChangeViewModel::run_deferred`] on its next turn, after the teardown has been
//!   observed, which publishes the target.
//! - **One-shot flags.** After a state with `usp`, `force_reload` or
//!   `open_reply_dialog` is published, a follow-up publication clears them.
//! - **Checks patchset.** After any publication, a `checks_patchset` equal to the
//!   numeric `patch_num` is cleared by another follow-up publication.
//! - **Patch range.** A numeric base that is not older than the numeric patchset
//!   is dropped last, so the published range always encodes as a valid diff.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::codec::{create_diff_url, create_edit_url};
use crate::error::ViewError;
use crate::model::{Model, SubscriptionId};
use crate::types::{
    normalize_base_patch_num, AttemptChoice, BasePatchSetNum, ChangeChildView, ChangeViewState, ChildView,
    DiffView, EditView, NumericChangeId, RevisionPatchSetNum, Tab,
};

/// Overrides for [`ChangeViewModel::diff_url`]. Unset fields fall back to the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffUrlOverride {
    pub change_num: Option<NumericChangeId>,
    pub repo: Option<String>,
    pub patch_num: Option<RevisionPatchSetNum>,
    pub base_patch_num: Option<BasePatchSetNum>,
    pub checks_patchset: Option<u32>,
    pub diff_view: Option<DiffView>,
}

/// Overrides for [`ChangeViewModel::edit_url`]. Unset fields fall back to the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditUrlOverride {
    pub change_num: Option<NumericChangeId>,
    pub repo: Option<String>,
    pub patch_num: Option<RevisionPatchSetNum>,
    pub edit_view: Option<EditView>,
}

pub struct ChangeViewModel {
    model: Model<ChangeViewState>,
    /// Targets of pending reloads, published by `run_deferred`.
    deferred: VecDeque<ChangeViewState>,
    base_url: String,
}

impl ChangeViewModel {
    /// Creates an empty model producing URLs under `base_url` (empty for none).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            model: Model::default(),
            deferred: VecDeque::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_state(&self) -> Option<Arc<ChangeViewState>> {
        self.model.get_state()
    }

    /// See [`Model::subscribe`].
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(Option<&Arc<ChangeViewState>>) + 'static,
    {
        self.model.subscribe(subscriber)
    }

    /// See [`Model::select`].
    pub fn select<T, P, C>(&mut self, project: P, on_change: C) -> SubscriptionId
    where
        T: PartialEq + 'static,
        P: Fn(Option<&ChangeViewState>) -> T + 'static,
        C: FnMut(&T) + 'static,
    {
        self.model.select(project, on_change)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.model.unsubscribe(id)
    }

    /// Replaces the state, or starts a reload when `state.force_reload` is set.
    pub fn set_state(&mut self, state: Option<ChangeViewState>) {
        match state {
            Some(state) if state.force_reload => self.force_load(state),
            state => self.publish(state),
        }
    }

    /// Applies `update` to a copy of the current state and sets the result.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::MissingRequiredState`] when the model is empty.
    pub fn update_state<F>(&mut self, update: F) -> Result<(), ViewError>
    where
        F: FnOnce(&mut ChangeViewState),
    {
        let current = self
            .model
            .get_state()
            .ok_or(ViewError::MissingRequiredState("change view state"))?;
        let mut next = ChangeViewState::clone(&current);
        update(&mut next);
        self.set_state(Some(next));
        Ok(())
    }

    /// Reloads the current state. Does nothing while the model is empty.
    pub fn reload(&mut self) {
        if let Some(current) = self.model.get_state() {
            self.force_load(ChangeViewState::clone(&current));
        }
    }

    /// `true` while a reload target is waiting for the next event loop turn.
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Publishes every queued reload target. Returns how many were published.
    pub fn run_deferred(&mut self) -> usize {
        let mut published = 0;
        while let Some(state) = self.deferred.pop_front() {
            self.publish(Some(state));
            published += 1;
        }
        published
    }

    fn force_load(&mut self, mut state: ChangeViewState) {
        tracing::debug!(change = %state.change_num, "reloading change view state");
        self.publish(None);
        state.force_reload = false;
        self.deferred.push_back(state);
    }

    fn publish(&mut self, state: Option<ChangeViewState>) {
        self.model.set_state(state);
        self.restore_invariants();
    }

    /// Publishes follow-up states until the current one needs no correction.
    fn restore_invariants(&mut self) {
        while let Some(current) = self.model.get_state() {
            let mut next = ChangeViewState::clone(&current);
            if next.has_one_shot_flags() {
                next.clear_one_shot_flags();
            } else if next.checks_patchset.is_some() && next.checks_patchset_is_redundant() {
                next.checks_patchset = None;
            } else if next.base_patch_num.is_some()
                && normalize_base_patch_num(next.patch_num, next.base_patch_num).is_none()
            {
                next.base_patch_num = None;
            } else {
                break;
            }
            self.model.set_state(Some(next));
        }
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    fn project<T>(&self, f: impl FnOnce(&ChangeViewState) -> T) -> Option<T> {
        self.model.get_state().map(|s| f(&*s))
    }

    pub fn change_num(&self) -> Option<NumericChangeId> {
        self.project(|s| s.change_num)
    }

    pub fn patch_num(&self) -> Option<RevisionPatchSetNum> {
        self.project(|s| s.patch_num).flatten()
    }

    pub fn base_patch_num(&self) -> Option<BasePatchSetNum> {
        self.project(|s| s.base_patch_num).flatten()
    }

    pub fn open_reply_dialog(&self) -> bool {
        self.project(|s| s.open_reply_dialog).unwrap_or(false)
    }

    pub fn comment_id(&self) -> Option<String> {
        self.project(|s| s.comment_id.clone()).flatten()
    }

    pub fn edit(&self) -> bool {
        self.project(|s| s.edit).unwrap_or(false)
    }

    pub fn edit_path(&self) -> Option<String> {
        self.project(|s| match &s.child_view {
            ChildView::Edit(edit) => Some(edit.path.clone()),
            _ => None,
        })
        .flatten()
    }

    pub fn diff_path(&self) -> Option<String> {
        self.project(|s| match &s.child_view {
            ChildView::Diff(diff) => Some(diff.path.clone()),
            _ => None,
        })
        .flatten()
    }

    pub fn diff_line(&self) -> Option<u32> {
        self.project(|s| match &s.child_view {
            ChildView::Diff(diff) => diff.line_num,
            _ => None,
        })
        .flatten()
    }

    pub fn diff_left_side(&self) -> bool {
        self.project(|s| matches!(&s.child_view, ChildView::Diff(d) if d.left_side))
            .unwrap_or(false)
    }

    pub fn child_view(&self) -> Option<ChangeChildView> {
        self.project(ChangeViewState::child_view_kind)
    }

    /// The selected tab with defaults applied; `Files` while empty.
    pub fn tab(&self) -> Tab {
        self.project(ChangeViewState::resolved_tab)
            .unwrap_or(Tab::Files)
    }

    /// The checks patchset, following `patch_num` when not chosen explicitly.
    pub fn checks_patchset(&self) -> Option<u32> {
        self.project(ChangeViewState::resolved_checks_patchset)
            .flatten()
    }

    pub fn attempt(&self) -> Option<AttemptChoice> {
        self.project(|s| s.attempt).flatten()
    }

    pub fn filter(&self) -> Option<String> {
        self.project(|s| s.filter.clone()).flatten()
    }

    pub fn checks_results_filter(&self) -> String {
        self.project(|s| s.checks_results_filter.clone())
            .flatten()
            .unwrap_or_default()
    }

    pub fn checks_runs_selected(&self) -> BTreeSet<String> {
        self.project(|s| s.checks_runs_selected.clone())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // State-dependent helpers
    // -----------------------------------------------------------------------

    /// Builds a DIFF URL, taking every field `over` leaves unset from the current state.
    ///
    /// A base that is not older than the patchset falls back to the parent.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::MissingRequiredState`] when the model is empty, no repo is
    /// known, or neither `over` nor the current state has a diff view.
    pub fn diff_url(&self, over: DiffUrlOverride) -> Result<String, ViewError> {
        let current = self
            .model
            .get_state()
            .ok_or(ViewError::MissingRequiredState("change_num"))?;
        let repo = over
            .repo
            .or_else(|| current.repo.clone())
            .ok_or(ViewError::MissingRequiredState("repo"))?;
        let diff_view = over
            .diff_view
            .or_else(|| match &current.child_view {
                ChildView::Diff(diff) => Some(diff.clone()),
                _ => None,
            })
            .ok_or(ViewError::MissingRequiredState("diff_view"))?;

        let patch_num = over.patch_num.or(current.patch_num);
        let base_patch_num =
            normalize_base_patch_num(patch_num, over.base_patch_num.or(current.base_patch_num));

        let mut state = ChangeViewState::new(
            over.change_num.unwrap_or(current.change_num),
            ChildView::Diff(diff_view.clone()),
        );
        state.repo = Some(repo);
        state.patch_num = patch_num;
        state.base_patch_num = base_patch_num;
        state.checks_patchset = over.checks_patchset.or(current.checks_patchset);
        Ok(create_diff_url(&self.base_url, &state, &diff_view))
    }

    /// Builds an EDIT URL, taking every field `over` leaves unset from the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::MissingRequiredState`] when the model is empty, no repo is
    /// known, or neither `over` nor the current state has an edit view.
    pub fn edit_url(&self, over: EditUrlOverride) -> Result<String, ViewError> {
        let current = self
            .model
            .get_state()
            .ok_or(ViewError::MissingRequiredState("change_num"))?;
        let repo = over
            .repo
            .or_else(|| current.repo.clone())
            .ok_or(ViewError::MissingRequiredState("repo"))?;
        let edit_view = over
            .edit_view
            .or_else(|| match &current.child_view {
                ChildView::Edit(edit) => Some(edit.clone()),
                _ => None,
            })
            .ok_or(ViewError::MissingRequiredState("edit_view"))?;

        let mut state = ChangeViewState::new(
            over.change_num.unwrap_or(current.change_num),
            ChildView::Edit(edit_view.clone()),
        );
        state.repo = Some(repo);
        state.patch_num = Some(
            over.patch_num
                .or(current.patch_num)
                .unwrap_or(RevisionPatchSetNum::Edit),
        );
        Ok(create_edit_url(&self.base_url, &state, &edit_view))
    }

    /// Adds `check_name` to the selected check runs, or removes it if already selected.
    ///
    /// The published set is never modified in place; a toggled copy replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::MissingRequiredState`] when the model is empty.
    pub fn toggle_selected_check_run(&mut self, check_name: &str) -> Result<(), ViewError> {
        self.update_state(|s| {
            let mut next = s.checks_runs_selected.clone();
            if !next.remove(check_name) {
                next.insert(check_name.to_owned());
            }
            s.checks_runs_selected = next;
        })
    }
}

impl std::fmt::Debug for ChangeViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeViewModel")
            .field("model", &self.model)
            .field("deferred", &self.deferred.len())
            .field("base_url", &self.base_url)
            .finish()
    }
}
