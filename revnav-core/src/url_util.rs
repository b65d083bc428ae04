//! Low-level URL pieces shared by the encoder and decoder.

use std::borrow::Cow;

use crate::error::ViewError;
use crate::types::{BasePatchSetNum, RevisionPatchSetNum};

/// Percent-encodes a path while keeping its `/` separators.
///
/// Every segment is encoded on its own, so `,`, `+`, `?`, `#` and `%` inside a repo
/// name or file path never collide with the `,edit` marker, the `/+/` separator,
/// the query or the fragment.
pub fn encode_url(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Reverses [`encode_url`] (and plain percent-encoding in general).
pub fn decode_url<'a>(url: &str, encoded: &'a str) -> Result<Cow<'a, str>, ViewError> {
    urlencoding::decode(encoded)
        .map_err(|_| ViewError::malformed(url, format!("invalid percent-encoding in `{encoded}`")))
}

/// Percent-encodes a single query parameter value.
pub fn encode_query_value(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Renders a patch range as `{patch}` or `{base}..{patch}`.
///
/// Returns an empty string without a patch: a base on its own is not expressible.
pub fn patch_range_expression(
    patch_num: Option<RevisionPatchSetNum>,
    base_patch_num: Option<BasePatchSetNum>,
) -> String {
    match (patch_num, base_patch_num) {
        (None, _) => String::new(),
        (Some(patch), None) => patch.to_string(),
        (Some(patch), Some(base)) => format!("{base}..{patch}"),
    }
}

/// Returns `url` without the `base_url` path prefix, or `None` if it does not start with it.
///
/// A trailing slash on the base is ignored.
pub fn strip_base_url<'a>(url: &'a str, base_url: &str) -> Option<&'a str> {
    url.strip_prefix(base_url.trim_end_matches('/'))
}

/// Reduces an absolute `http(s)` URL to its path, query and fragment.
///
/// Anything else is assumed to already be a path and is returned unchanged.
pub fn parse_location(input: &str) -> Result<Cow<'_, str>, ViewError> {
    let trimmed = input.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Ok(Cow::Borrowed(trimmed));
    }
    let parsed = ::url::Url::parse(trimmed)
        .map_err(|e| ViewError::malformed(input, format!("not a valid url: {e}")))?;
    let mut location = parsed.path().to_owned();
    if let Some(query) = parsed.query() {
        location.push('?');
        location.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        location.push('#');
        location.push_str(fragment);
    }
    Ok(Cow::Owned(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_url_keeps_slashes_and_escapes_markers() {
        assert_eq!(encode_url("a/b.txt"), "a/b.txt");
        assert_eq!(encode_url("my/repo"), "my/repo");
        assert_eq!(encode_url("a,edit"), "a%2Cedit");
        assert_eq!(encode_url("c++/x y"), "c%2B%2B/x%20y");
        assert_eq!(encode_url(""), "");
    }

    #[test]
    fn decode_url_reverses_encode_url() {
        let raw = "dir with space/50%/a+b,c.txt";
        assert_eq!(decode_url(raw, &encode_url(raw)).unwrap(), raw);
    }

    #[test]
    fn patch_range_expression_shapes() {
        use BasePatchSetNum as B;
        use RevisionPatchSetNum as R;
        assert_eq!(patch_range_expression(None, None), "");
        assert_eq!(patch_range_expression(None, Some(B::Number(1))), "");
        assert_eq!(patch_range_expression(Some(R::Number(2)), None), "2");
        assert_eq!(patch_range_expression(Some(R::Number(5)), Some(B::Number(3))), "3..5");
        assert_eq!(patch_range_expression(Some(R::Edit), Some(B::MergeParent(1))), "-1..edit");
    }

    #[test]
    fn strip_base_url_ignores_trailing_slash() {
        assert_eq!(strip_base_url("/gerrit/c/1", "/gerrit/"), Some("/c/1"));
        assert_eq!(strip_base_url("/c/1", ""), Some("/c/1"));
        assert_eq!(strip_base_url("/other/c/1", "/gerrit"), None);
    }

    #[test]
    fn parse_location_drops_scheme_and_host() {
        let location = parse_location("https://review.example.com/c/r/+/1/2?tab=checks#x").unwrap();
        assert_eq!(location, "/c/r/+/1/2?tab=checks#x");
        assert_eq!(parse_location(" /c/1 ").unwrap(), "/c/1");
    }
}
