use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tab::Tab;

/// Tab state as written to durable storage under a single key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(default)]
    pub tabs: Vec<SessionTab>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
}

/// Session as read back from storage, before each tab is decoded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    #[serde(default)]
    tabs: Vec<Value>,
    #[serde(default)]
    active_tab_id: Option<Value>,
}

impl SessionData {
    /// Decodes a stored session tab by tab.
    ///
    /// Tab entries that do not decode are skipped and counted, so one damaged
    /// record never costs the rest of the session. A non-string active id is
    /// treated as absent. Fails only when the value is not a session object.
    pub fn decode_lenient(value: Value) -> Result<(Self, usize), serde_json::Error> {
        let raw: RawSession = serde_json::from_value(value)?;
        let total = raw.tabs.len();
        let tabs: Vec<SessionTab> = raw
            .tabs
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        let dropped = total - tabs.len();
        let active_tab_id = raw
            .active_tab_id
            .and_then(|v| v.as_str().map(str::to_string));
        Ok((Self { tabs, active_tab_id }, dropped))
    }
}

/// A tab as stored in a session. Older snapshots may lack `lastActive`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTab {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<i64>,
}

impl From<&Tab> for SessionTab {
    fn from(tab: &Tab) -> Self {
        Self {
            id: tab.id.clone(),
            title: tab.title.clone(),
            url: tab.url.clone(),
            last_active: Some(tab.last_active),
        }
    }
}
