//! Error type shared by the codec and the change view model.

use thiserror::Error;

/// Failures surfaced by URL decoding and by state-dependent URL helpers.
///
/// Both variants are atomic: no partially decoded state or partially built URL
/// is ever returned alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The URL does not match any change view shape. The router decides the fallback.
    #[error("malformed change view url `{url}`: {reason}")]
    MalformedViewUrl {
        /// The input as received (before base-url stripping).
        url: String,
        /// Which part of the URL failed to parse.
        reason: String,
    },

    /// A helper that reads the current state was called while the store is empty,
    /// or the current state lacks the named field.
    #[error("change view state is missing `{0}`")]
    MissingRequiredState(&'static str),
}

impl ViewError {
    pub(crate) fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedViewUrl {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}
