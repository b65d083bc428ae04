//! Publication behaviour of the change view model.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use revnav_core::{
    create_change_view_url, parse_change_view_url, BasePatchSetNum, ChangeChildView,
    ChangeViewModel, ChangeViewState, ChildView, DiffUrlOverride, DiffView, EditUrlOverride,
    EditView, NumericChangeId, RevisionPatchSetNum, Tab, ViewError,
};

type Log = Rc<RefCell<Vec<Option<ChangeViewState>>>>;

/// Subscribes a recorder and drops the replayed initial value.
fn record(model: &mut ChangeViewModel) -> Log {
    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    model.subscribe(move |s| sink.borrow_mut().push(s.map(|s| (**s).clone())));
    log.borrow_mut().clear();
    log
}

fn change(n: u32) -> NumericChangeId {
    NumericChangeId::new(n).unwrap()
}

fn overview(n: u32) -> ChangeViewState {
    ChangeViewState::new(change(n), ChildView::Overview)
}

#[test]
fn plain_set_state_publishes_once() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);
    model.set_state(Some(overview(1)));
    assert_eq!(*log.borrow(), vec![Some(overview(1))]);
    assert!(!model.has_deferred());
}

#[test]
fn force_reload_url_tears_down_then_restores() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(9)));
    let log = record(&mut model);

    let target = parse_change_view_url("/c/42?forceReload=true", "").unwrap();
    assert!(target.force_reload);
    model.set_state(Some(target));

    assert_eq!(*log.borrow(), vec![None]);
    assert!(model.has_deferred());
    assert_eq!(model.run_deferred(), 1);

    assert_eq!(*log.borrow(), vec![None, Some(overview(42))]);
    assert!(!model.get_state().unwrap().force_reload);
    assert!(!model.has_deferred());
}

#[test]
fn reload_republishes_current_state() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(3).with_repo("r")));
    let log = record(&mut model);

    model.reload();
    model.run_deferred();
    assert_eq!(*log.borrow(), vec![None, Some(overview(3).with_repo("r"))]);
}

#[test]
fn reload_on_empty_model_does_nothing() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);
    model.reload();
    assert!(log.borrow().is_empty());
    assert!(!model.has_deferred());
}

#[test]
fn one_shot_flags_are_cleared_by_a_follow_up() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);

    let mut state = overview(5);
    state.open_reply_dialog = true;
    state.usp = Some("dashboard".to_owned());
    model.set_state(Some(state.clone()));

    assert_eq!(*log.borrow(), vec![Some(state), Some(overview(5))]);
    assert!(!model.open_reply_dialog());
}

#[test]
fn redundant_checks_patchset_is_cleared_after_flags() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);

    let mut state = overview(5).with_patch_num(RevisionPatchSetNum::Number(2));
    state.checks_patchset = Some(2);
    state.open_reply_dialog = true;
    model.set_state(Some(state.clone()));

    let mut without_flags = state.clone();
    without_flags.open_reply_dialog = false;
    let mut settled = without_flags.clone();
    settled.checks_patchset = None;
    assert_eq!(
        *log.borrow(),
        vec![Some(state), Some(without_flags), Some(settled)]
    );
    assert_eq!(model.checks_patchset(), Some(2), "follows the patchset");
}

#[test]
fn inverted_patch_range_falls_back_to_parent() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);

    let inverted = parse_change_view_url("/c/42/5..3", "").unwrap();
    assert_eq!(inverted.base_patch_num, Some(BasePatchSetNum::Number(5)));
    model.set_state(Some(inverted.clone()));

    let mut corrected = inverted.clone();
    corrected.base_patch_num = None;
    assert_eq!(*log.borrow(), vec![Some(inverted), Some(corrected)]);
    assert_eq!(
        create_change_view_url("", &model.get_state().unwrap()),
        "/c/42/3"
    );
}

#[test]
fn merge_parent_base_is_kept() {
    let mut model = ChangeViewModel::new("");
    let log = record(&mut model);
    model.set_state(Some(parse_change_view_url("/c/42/-1..3", "").unwrap()));
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(model.base_patch_num(), Some(BasePatchSetNum::MergeParent(1)));
}

#[test]
fn update_state_requires_a_state() {
    let mut model = ChangeViewModel::new("");
    assert_eq!(
        model.update_state(|s| s.edit = true),
        Err(ViewError::MissingRequiredState("change view state"))
    );

    model.set_state(Some(overview(1)));
    model.update_state(|s| s.tab = Some(Tab::Checks)).unwrap();
    assert_eq!(model.tab(), Tab::Checks);
}

#[test]
fn update_state_with_force_reload_goes_through_reload() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(1)));
    let log = record(&mut model);

    model.update_state(|s| s.force_reload = true).unwrap();
    assert_eq!(*log.borrow(), vec![None]);
    model.run_deferred();
    assert_eq!(*log.borrow(), vec![None, Some(overview(1))]);
}

#[test]
fn toggling_check_runs_replaces_the_set() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(1)));
    let before = model.get_state().unwrap();

    model.toggle_selected_check_run("lint").unwrap();
    model.toggle_selected_check_run("build").unwrap();
    assert_eq!(
        model.checks_runs_selected(),
        BTreeSet::from(["build".to_owned(), "lint".to_owned()])
    );
    model.toggle_selected_check_run("lint").unwrap();
    assert_eq!(model.checks_runs_selected(), BTreeSet::from(["build".to_owned()]));

    assert!(before.checks_runs_selected.is_empty(), "published snapshot untouched");
}

#[test]
fn projections_of_a_diff_state() {
    let mut model = ChangeViewModel::new("");
    assert_eq!(model.child_view(), None);
    assert_eq!(model.tab(), Tab::Files);
    assert_eq!(model.checks_results_filter(), "");

    let mut state = ChangeViewState::new(
        change(8),
        ChildView::Diff(DiffView {
            path: "lib.rs".to_owned(),
            line_num: Some(12),
            left_side: true,
        }),
    );
    state.patch_num = Some(RevisionPatchSetNum::Number(4));
    state.base_patch_num = Some(BasePatchSetNum::Number(2));
    state.comment_id = Some("c".to_owned());
    model.set_state(Some(state));

    assert_eq!(model.change_num(), Some(change(8)));
    assert_eq!(model.child_view(), Some(ChangeChildView::Diff));
    assert_eq!(model.diff_path().as_deref(), Some("lib.rs"));
    assert_eq!(model.diff_line(), Some(12));
    assert!(model.diff_left_side());
    assert_eq!(model.edit_path(), None);
    assert_eq!(model.patch_num(), Some(RevisionPatchSetNum::Number(4)));
    assert_eq!(model.base_patch_num(), Some(BasePatchSetNum::Number(2)));
    assert_eq!(model.comment_id().as_deref(), Some("c"));
    assert_eq!(model.tab(), Tab::CommentThreads);
}

#[test]
fn select_only_fires_on_changes() {
    let mut model = ChangeViewModel::new("");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    model.select(
        |s| s.map(ChangeViewState::resolved_tab),
        move |tab| sink.borrow_mut().push(tab.clone()),
    );

    model.set_state(Some(overview(1)));
    model.update_state(|s| s.filter = Some("x".to_owned())).unwrap();
    model.update_state(|s| s.tab = Some(Tab::Checks)).unwrap();

    assert_eq!(*seen.borrow(), vec![None, Some(Tab::Files), Some(Tab::Checks)]);
}

#[test]
fn diff_url_normalizes_inverted_range() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(42).with_repo("r")));

    let url = model
        .diff_url(DiffUrlOverride {
            patch_num: Some(RevisionPatchSetNum::Number(3)),
            base_patch_num: Some(BasePatchSetNum::Number(5)),
            diff_view: Some(DiffView::new("a.txt")),
            ..DiffUrlOverride::default()
        })
        .unwrap();
    assert_eq!(url, "/c/r/+/42/3/a.txt");
}

#[test]
fn diff_url_falls_back_to_current_state() {
    let mut model = ChangeViewModel::new("/g");
    let mut state = ChangeViewState::new(change(4), ChildView::Diff(DiffView::new("x.rs")))
        .with_repo("r")
        .with_patch_num(RevisionPatchSetNum::Number(6));
    state.base_patch_num = Some(BasePatchSetNum::Number(2));
    model.set_state(Some(state));

    let url = model
        .diff_url(DiffUrlOverride {
            checks_patchset: Some(1),
            ..DiffUrlOverride::default()
        })
        .unwrap();
    assert_eq!(url, "/g/c/r/+/4/2..6/x.rs?checksPatchset=1");
}

#[test]
fn urls_require_state_and_repo() {
    let mut model = ChangeViewModel::new("");
    let over = DiffUrlOverride {
        diff_view: Some(DiffView::new("a")),
        ..DiffUrlOverride::default()
    };
    assert!(matches!(
        model.diff_url(over.clone()),
        Err(ViewError::MissingRequiredState(_))
    ));

    model.set_state(Some(overview(1)));
    assert_eq!(
        model.diff_url(over),
        Err(ViewError::MissingRequiredState("repo"))
    );
    assert_eq!(
        model.edit_url(EditUrlOverride {
            repo: Some("r".to_owned()),
            ..EditUrlOverride::default()
        }),
        Err(ViewError::MissingRequiredState("edit_view"))
    );
}

#[test]
fn edit_url_defaults_to_edit_revision() {
    let mut model = ChangeViewModel::new("");
    model.set_state(Some(overview(7).with_repo("r")));
    let url = model
        .edit_url(EditUrlOverride {
            edit_view: Some(EditView {
                path: "x.txt".to_owned(),
                line_num: Some(5),
            }),
            ..EditUrlOverride::default()
        })
        .unwrap();
    assert_eq!(url, "/c/r/+/7/x.txt,edit#5");
}
