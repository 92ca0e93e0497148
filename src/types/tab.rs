use serde::{Deserialize, Serialize};

/// One embedded chat session shown as a tab in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Milliseconds since the UNIX epoch when the tab was last foregrounded or backgrounded.
    pub last_active: i64,
}

impl Tab {
    /// Returns true when the tab was active within `limit_ms` of `now_ms`.
    pub fn is_recent(&self, now_ms: i64, limit_ms: i64) -> bool {
        now_ms - self.last_active <= limit_ms
    }

    /// Returns true if the tab points at one of the given internal url prefixes
    /// (extension pages such as the settings screen).
    pub fn is_internal(&self, internal_prefixes: &[String]) -> bool {
        is_internal_url(&self.url, internal_prefixes)
    }
}

/// Returns true if `url` starts with any of the internal prefixes.
pub fn is_internal_url(url: &str, internal_prefixes: &[String]) -> bool {
    internal_prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
}
