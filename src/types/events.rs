use serde::{Deserialize, Serialize};

/// User intents and frame reports delivered to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    AddTab,
    CloseTab { id: String },
    SwitchTab { id: String },
    UpdateUrl { id: String, url: String },
    UpdateTitle { id: String, title: String },
    /// Navigation report from the content script running inside a frame.
    FrameStateChanged {
        tab_id: String,
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        auto_redirect: bool,
    },
    BookmarkSelect { title: String, url: String },
    /// Toggle a bookmark for whatever tab is currently active.
    BookmarkToggleActive,
    BookmarkRemove { url: String },
    BookmarkUpdate { url: String, title: String },
}
