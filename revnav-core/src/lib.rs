//! Change view routing for a code review client.
//!
//! [`ChangeViewState`] describes where the user is inside a change. The [`codec`]
//! module maps it to and from URLs, [`ChangeViewModel`] publishes it to
//! subscribers, and [`db`] keeps a history of visited locations.

pub mod change_model;
pub mod codec;
pub mod db;
pub mod error;
pub mod model;
pub mod schema;
pub mod types;
pub mod url_util;

pub use change_model::{ChangeViewModel, DiffUrlOverride, EditUrlOverride};
pub use codec::{
    create_change_url, create_change_view_url, create_diff_url, create_edit_url,
    parse_change_view_url,
};
pub use error::ViewError;
pub use model::{Model, SubscriptionId};
pub use types::{
    normalize_base_patch_num, AttemptChoice, BasePatchSetNum, ChangeChildView, ChangeViewState,
    ChildView, DiffView, EditView, NumericChangeId, RevisionPatchSetNum, Tab,
};
