use serde::{Deserialize, Serialize};

/// A saved conversation link. The url is the bookmark's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    pub added_at: i64,
    /// Set when the link no longer resolves to the conversation it was saved for.
    #[serde(default)]
    pub broken: bool,
}
