use serde::{Deserialize, Serialize};

/// An instruction for the embedding layer that owns the heavyweight frames.
///
/// The load scheduler only decides when a frame should be loaded or dropped;
/// creating and destroying the frame itself is up to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameCommand {
    /// Point the tab's frame at `url` now.
    Load { tab_id: String, url: String },
    /// Destroy the tab's frame and free its resources.
    Unload { tab_id: String },
    /// Show or hide the tab's frame as the foreground one.
    SetCurrent { tab_id: String, current: bool },
}

