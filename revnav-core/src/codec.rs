//! Bidirectional mapping between [`ChangeViewState`] and change page URLs.
//!
//! URL shapes, with `{range}` being empty, `/{patch}` or `/{base}..{patch}`:
//!
//! | Child view | Path                                                        | Fragment     |
//! |------------|-------------------------------------------------------------|--------------|
//! | OVERVIEW   | `/c/{repo}/+/{change}{range}[,edit][/comments/{commentId}]` | message hash |
//! | DIFF       | `/c/{repo}/+/{change}{range}/{path}[comment/{commentId}/]`  | `#[b]{line}` |
//! | EDIT       | `/c/{repo}/+/{change}{range}/{path},edit`                   | `#{line}`    |
//!
//! The `{repo}/+/` part is omitted when the state has no repo. Encoding is total;
//! decoding fails with [`ViewError::MalformedViewUrl`] and never returns a partial state.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ViewError;
use crate::types::{
    AttemptChoice, BasePatchSetNum, ChangeViewState, ChildView, DiffView, EditView,
    NumericChangeId, RevisionPatchSetNum, Tab,
};
use crate::url_util::{
    decode_url, encode_query_value, encode_url, parse_location, patch_range_expression,
    strip_base_url,
};

static CHANGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/c/(?:(.+?)/\+/)?(\d+)(.*)$").expect("valid change path regex"));
static PATCH_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(-?\d+)\.\.)?(\d+|edit)$").expect("valid patch range regex"));
static DIFF_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)comment/([^/]+)/$").expect("valid diff comment regex"));
static DIFF_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(b?)(\d+)$").expect("valid diff line regex"));
static EDIT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(\d+)$").expect("valid edit line regex"));

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes `state` for its own child view.
pub fn create_change_view_url(base_url: &str, state: &ChangeViewState) -> String {
    match &state.child_view {
        ChildView::Overview => create_change_url(base_url, state),
        ChildView::Diff(diff) => create_diff_url(base_url, state, diff),
        ChildView::Edit(edit) => create_edit_url(base_url, state, edit),
    }
}

/// Encodes the OVERVIEW page of `state`, whatever its child view.
///
/// Query parameters are emitted in a fixed order so equal states always produce
/// byte-identical URLs.
pub fn create_change_url(base_url: &str, state: &ChangeViewState) -> String {
    let mut queries: Vec<String> = Vec::new();
    if let Some(param) = checks_patchset_param(state) {
        queries.push(param);
    }
    match state.attempt {
        Some(AttemptChoice::Latest) | None => {}
        Some(attempt) => queries.push(format!("attempt={attempt}")),
    }
    if let Some(filter) = non_empty(&state.filter) {
        queries.push(format!("filter={}", encode_query_value(filter)));
    }
    if let Some(filter) = non_empty(&state.checks_results_filter) {
        queries.push(format!("checksResultsFilter={}", encode_query_value(filter)));
    }
    let runs: Vec<_> = state
        .checks_runs_selected
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| encode_query_value(name))
        .collect();
    if !runs.is_empty() {
        queries.push(format!("checksRunsSelected={}", runs.join(",")));
    }
    if let Some(tab) = &state.tab {
        if Tab::from(tab.as_str()) != Tab::Files && !tab.as_str().is_empty() {
            queries.push(format!("tab={}", encode_query_value(tab.as_str())));
        }
    }
    if state.force_reload {
        queries.push("forceReload=true".to_owned());
    }
    if state.open_reply_dialog {
        queries.push("openReplyDialog=true".to_owned());
    }
    if let Some(usp) = non_empty(&state.usp) {
        queries.push(format!("usp={}", encode_query_value(usp)));
    }

    let mut suffix = String::new();
    if state.edit {
        suffix.push_str(",edit");
    }
    if let Some(comment_id) = non_empty(&state.comment_id) {
        suffix.push_str("/comments/");
        suffix.push_str(&encode_query_value(comment_id));
    }
    if !queries.is_empty() {
        suffix.push('?');
        suffix.push_str(&queries.join("&"));
    }
    if let Some(hash) = non_empty(&state.message_hash) {
        if !hash.starts_with('#') {
            suffix.push('#');
        }
        suffix.push_str(hash);
    }

    let common = create_change_url_common(base_url, state, state.patch_num, state.base_patch_num);
    format!("{common}{suffix}")
}

/// Encodes a DIFF page for `diff` using the identity, range and checks patchset of `state`.
///
/// `state.comment_id` turns the URL into a link to that comment inside the file.
pub fn create_diff_url(base_url: &str, state: &ChangeViewState, diff: &DiffView) -> String {
    let mut path = format!("/{}", encode_url(&diff.path));
    if let Some(comment_id) = non_empty(&state.comment_id) {
        path.push_str("comment/");
        path.push_str(&encode_query_value(comment_id));
        path.push('/');
    }

    let query = checks_patchset_param(state)
        .map(|param| format!("?{param}"))
        .unwrap_or_default();

    let hash = match diff.line_num {
        Some(line) if line > 0 => {
            let side = if diff.left_side { "b" } else { "" };
            format!("#{side}{line}")
        }
        _ => String::new(),
    };

    let common = create_change_url_common(base_url, state, state.patch_num, state.base_patch_num);
    format!("{common}{path}{query}{hash}")
}

/// Encodes an EDIT page for `edit`.
///
/// The edit revision is implied by the `,edit` suffix, so only a numeric patchset is
/// written into the range, and never a base.
pub fn create_edit_url(base_url: &str, state: &ChangeViewState, edit: &EditView) -> String {
    let patch_num = state.patch_num.filter(|p| *p != RevisionPatchSetNum::Edit);
    let path = encode_url(&edit.path);
    let hash = match edit.line_num {
        Some(line) if line > 0 => format!("#{line}"),
        _ => String::new(),
    };

    let common = create_change_url_common(base_url, state, patch_num, None);
    format!("{common}/{path},edit{hash}")
}

/// The prefix shared by all child views: base url, identity and patch range.
fn create_change_url_common(
    base_url: &str,
    state: &ChangeViewState,
    patch_num: Option<RevisionPatchSetNum>,
    base_patch_num: Option<BasePatchSetNum>,
) -> String {
    let mut range = patch_range_expression(patch_num, base_patch_num);
    if !range.is_empty() {
        range.insert(0, '/');
    }

    let repo = match non_empty(&state.repo) {
        Some(repo) => format!("{}/+/", encode_url(repo)),
        None => String::new(),
    };

    format!(
        "{}/c/{repo}{}{range}",
        base_url.trim_end_matches('/'),
        state.change_num
    )
}

fn checks_patchset_param(state: &ChangeViewState) -> Option<String> {
    match state.checks_patchset {
        Some(ps) if !state.checks_patchset_is_redundant() => Some(format!("checksPatchset={ps}")),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// The path part after the change number, classified by child view.
#[derive(Debug)]
enum PathShape<'a> {
    Overview {
        edit: bool,
        comment_id: Option<&'a str>,
    },
    Diff {
        path: &'a str,
        comment_id: Option<&'a str>,
    },
    Edit {
        path: &'a str,
    },
}

/// Query parameters understood by the change page. Everything else is ignored.
#[derive(Debug, Default)]
struct QueryParams {
    checks_patchset: Option<u32>,
    attempt: Option<AttemptChoice>,
    filter: Option<String>,
    checks_results_filter: Option<String>,
    checks_runs_selected: BTreeSet<String>,
    tab: Option<Tab>,
    force_reload: bool,
    open_reply_dialog: bool,
    usp: Option<String>,
}

/// Decodes a change page URL back into a [`ChangeViewState`].
///
/// `url` may be a path (`/c/...`) or an absolute `http(s)` URL; `base_url` is the path
/// prefix the application is served under (empty for none). Only the query parameters
/// the decoded child view emits are applied; unknown parameters and unparseable values
/// are ignored.
///
/// # Errors
///
/// Returns [`ViewError::MalformedViewUrl`] when the URL lies outside `base_url`, has
/// no positive change number, or its path or fragment does not match any child view.
pub fn parse_change_view_url(url: &str, base_url: &str) -> Result<ChangeViewState, ViewError> {
    let location = parse_location(url)?;
    let location = strip_base_url(&location, base_url)
        .ok_or_else(|| ViewError::malformed(url, format!("not under base url `{base_url}`")))?;

    let (before_hash, fragment) = match location.find('#') {
        Some(i) => (&location[..i], Some(&location[i..])),
        None => (location, None),
    };
    let (path, query) = match before_hash.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (before_hash, None),
    };

    let caps = CHANGE_PATH
        .captures(path)
        .ok_or_else(|| ViewError::malformed(url, "expected `/c/[{repo}/+/]{change}`"))?;
    let repo = caps
        .get(1)
        .map(|m| decode_url(url, m.as_str()).map(|r| r.into_owned()))
        .transpose()?;
    let change_num = caps[2]
        .parse::<u32>()
        .ok()
        .and_then(NumericChangeId::new)
        .ok_or_else(|| ViewError::malformed(url, "change number must be a positive integer"))?;
    let remainder = caps.get(3).map_or("", |m| m.as_str());

    let (patch_num, base_patch_num, rest) = split_patch_range(url, remainder)?;
    let shape = classify_path(url, rest)?;

    let mut state = ChangeViewState::new(change_num, ChildView::Overview);
    state.repo = repo;
    state.patch_num = patch_num;
    state.base_patch_num = base_patch_num;

    match shape {
        PathShape::Overview { edit, comment_id } => {
            let params = parse_query(url, query.unwrap_or(""));
            state.edit = edit;
            state.comment_id = decode_optional(url, comment_id)?;
            state.checks_patchset = params.checks_patchset;
            state.attempt = params.attempt;
            state.filter = params.filter;
            state.checks_results_filter = params.checks_results_filter;
            state.checks_runs_selected = params.checks_runs_selected;
            state.tab = params.tab;
            state.force_reload = params.force_reload;
            state.open_reply_dialog = params.open_reply_dialog;
            state.usp = params.usp;
            state.message_hash = fragment.map(str::to_owned);
        }
        PathShape::Diff { path, comment_id } => {
            let params = parse_query(url, query.unwrap_or(""));
            let (line_num, left_side) = match fragment.filter(|f| *f != "#") {
                None => (None, false),
                Some(f) => {
                    let caps = DIFF_LINE
                        .captures(f)
                        .ok_or_else(|| ViewError::malformed(url, "diff fragment must be `#[b]{line}`"))?;
                    let line = parse_line(url, &caps[2])?;
                    (line, line.is_some() && !caps[1].is_empty())
                }
            };
            state.comment_id = decode_optional(url, comment_id)?;
            state.checks_patchset = params.checks_patchset;
            state.child_view = ChildView::Diff(DiffView {
                path: decode_url(url, path)?.into_owned(),
                line_num,
                left_side,
            });
        }
        PathShape::Edit { path } => {
            let line_num = match fragment.filter(|f| *f != "#") {
                None => None,
                Some(f) => {
                    let caps = EDIT_LINE
                        .captures(f)
                        .ok_or_else(|| ViewError::malformed(url, "edit fragment must be `#{line}`"))?;
                    parse_line(url, &caps[1])?
                }
            };
            state.patch_num = Some(patch_num.unwrap_or(RevisionPatchSetNum::Edit));
            state.base_patch_num = None;
            state.child_view = ChildView::Edit(EditView {
                path: decode_url(url, path)?.into_owned(),
                line_num,
            });
        }
    }

    Ok(state)
}

/// Splits a leading `/{range}` segment off the path remainder, if there is one.
fn split_patch_range<'a>(
    url: &str,
    remainder: &'a str,
) -> Result<(Option<RevisionPatchSetNum>, Option<BasePatchSetNum>, &'a str), ViewError> {
    let Some(after) = remainder.strip_prefix('/') else {
        return Ok((None, None, remainder));
    };
    let end = after.find(|c: char| c == '/' || c == ',').unwrap_or(after.len());
    let Some(caps) = PATCH_RANGE.captures(&after[..end]) else {
        return Ok((None, None, remainder));
    };

    let patch_num = caps[2]
        .parse::<RevisionPatchSetNum>()
        .map_err(|e| ViewError::malformed(url, format!("bad patchset: {e}")))?;
    let base_patch_num = caps
        .get(1)
        .map(|m| m.as_str().parse::<BasePatchSetNum>())
        .transpose()
        .map_err(|e| ViewError::malformed(url, format!("bad base patchset: {e}")))?;

    Ok((Some(patch_num), base_patch_num, &after[end..]))
}

fn classify_path<'a>(url: &str, rest: &'a str) -> Result<PathShape<'a>, ViewError> {
    if rest.is_empty() {
        return Ok(PathShape::Overview {
            edit: false,
            comment_id: None,
        });
    }
    if let Some(tail) = rest.strip_prefix(",edit") {
        return Ok(PathShape::Overview {
            edit: true,
            comment_id: overview_comment(url, tail)?,
        });
    }
    let Some(file) = rest.strip_prefix('/') else {
        return Err(ViewError::malformed(
            url,
            format!("unexpected `{rest}` after change number"),
        ));
    };
    if let Some(path) = file.strip_suffix(",edit") {
        return Ok(PathShape::Edit { path });
    }
    if rest.starts_with("/comments/") {
        return Ok(PathShape::Overview {
            edit: false,
            comment_id: overview_comment(url, rest)?,
        });
    }
    match DIFF_COMMENT.captures(file) {
        Some(caps) => {
            let path = caps.get(1).map_or("", |m| m.as_str());
            let comment_id = caps.get(2).map(|m| m.as_str());
            Ok(PathShape::Diff { path, comment_id })
        }
        None => Ok(PathShape::Diff {
            path: file,
            comment_id: None,
        }),
    }
}

/// Parses an optional `/comments/{id}` tail of an OVERVIEW path.
fn overview_comment<'a>(url: &str, tail: &'a str) -> Result<Option<&'a str>, ViewError> {
    if tail.is_empty() {
        return Ok(None);
    }
    match tail.strip_prefix("/comments/") {
        Some(id) if !id.is_empty() && !id.contains('/') => Ok(Some(id)),
        _ => Err(ViewError::malformed(
            url,
            format!("expected `/comments/{{id}}`, found `{tail}`"),
        )),
    }
}

fn parse_query(url: &str, query: &str) -> QueryParams {
    let mut params = QueryParams::default();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let Ok(key) = decode_url(url, raw_key) else {
            tracing::debug!(url, pair, "ignoring undecodable query parameter");
            continue;
        };

        if key == "checksRunsSelected" {
            params.checks_runs_selected = raw_value
                .split(',')
                .filter_map(|name| decode_url(url, name).ok())
                .filter(|name| !name.is_empty())
                .map(|name| name.into_owned())
                .collect();
            continue;
        }

        let Ok(value) = decode_url(url, raw_value) else {
            tracing::debug!(url, %key, "ignoring undecodable query value");
            continue;
        };
        let text = || Some(value.to_string()).filter(|v| !v.is_empty());
        match &*key {
            "checksPatchset" => match value.parse::<u32>() {
                Ok(ps) if ps > 0 => params.checks_patchset = Some(ps),
                _ => tracing::debug!(url, %value, "ignoring invalid checksPatchset"),
            },
            "attempt" => match value.parse::<AttemptChoice>() {
                Ok(attempt) => params.attempt = Some(attempt),
                Err(_) => tracing::debug!(url, %value, "ignoring invalid attempt"),
            },
            "filter" => params.filter = text(),
            "checksResultsFilter" => params.checks_results_filter = text(),
            "tab" => params.tab = text().map(|t| Tab::from(t.as_str())),
            "forceReload" => params.force_reload = value == "true",
            "openReplyDialog" => params.open_reply_dialog = value == "true",
            "usp" => params.usp = text(),
            _ => tracing::debug!(url, %key, "ignoring unknown query parameter"),
        }
    }
    params
}

fn decode_optional(url: &str, value: Option<&str>) -> Result<Option<String>, ViewError> {
    value
        .map(|v| decode_url(url, v).map(|d| d.into_owned()))
        .transpose()
}

/// Line anchors are 1-based; `0` means "no line".
fn parse_line(url: &str, digits: &str) -> Result<Option<u32>, ViewError> {
    digits
        .parse::<u32>()
        .map(|line| Some(line).filter(|l| *l > 0))
        .map_err(|e| ViewError::malformed(url, format!("bad line number: {e}")))
}
