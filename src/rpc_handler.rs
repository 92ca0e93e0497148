//! RPC method handler for the SideTabs JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a method call to the coordinator and returns
//! a JSON result for the host page.

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::BookmarkManagerTrait;
use crate::managers::tab_store::TabStoreTrait;
use crate::types::tab::is_internal_url;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn bool_param(params: &Value, key: &str) -> Result<bool, String> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| format!("missing {}", key))
}

/// Only web pages and the panel's own internal pages may be opened or bookmarked.
fn validate_url(app: &App, url: &str) -> Result<(), String> {
    if url.starts_with("http://")
        || url.starts_with("https://")
        || is_internal_url(url, &app.settings.tabs.internal_url_prefixes)
    {
        Ok(())
    } else {
        Err("invalid url: must start with http:// or https://".to_string())
    }
}

/// Current tab state as returned by the tab methods.
pub fn tab_state(app: &App) -> Value {
    json!({
        "tabs": app.tab_store.get_tabs(),
        "active_tab_id": app.tab_store.get_active_tab_id(),
        "loaded": app.loaded_tab_ids(),
    })
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Tabs ───
        "tab.add" => {
            let title = params.get("title").and_then(|v| v.as_str());
            let url = params.get("url").and_then(|v| v.as_str());
            if let Some(url) = url {
                validate_url(app, url)?;
            }
            let id = app.tab_store.add_tab(title, url);
            Ok(json!({"id": id}))
        }
        "tab.close" => {
            let id = str_param(params, "id")?;
            app.close_tab(id);
            Ok(tab_state(app))
        }
        "tab.switch" => {
            let id = str_param(params, "id")?;
            app.tab_store.set_active_tab(id);
            Ok(tab_state(app))
        }
        "tab.update_url" => {
            let id = str_param(params, "id")?;
            let url = str_param(params, "url")?;
            validate_url(app, url)?;
            app.tab_store.update_tab_url(id, url);
            Ok(json!({"ok": true}))
        }
        "tab.update_title" => {
            let id = str_param(params, "id")?;
            let title = str_param(params, "title")?;
            app.tab_store.update_tab_title(id, title);
            Ok(json!({"ok": true}))
        }
        "tab.frame_state" => {
            let tab_id = str_param(params, "tab_id")?;
            let url = str_param(params, "url")?;
            validate_url(app, url)?;
            let title = params.get("title").and_then(|v| v.as_str());
            let auto_redirect = params
                .get("auto_redirect")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            app.report_frame_state(tab_id, url, title, auto_redirect);
            Ok(json!({"ok": true}))
        }
        "tab.list" => Ok(tab_state(app)),

        // ─── Bookmarks ───
        "bookmark.list" => Ok(json!(app.bookmarks.get_bookmarks())),
        "bookmark.toggle" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            validate_url(app, url)?;
            let bookmarked = app.bookmarks.toggle(title, url).map_err(|e| e.to_string())?;
            Ok(json!({"bookmarked": bookmarked}))
        }
        "bookmark.toggle_active" => {
            let bookmarked = app.toggle_active_bookmark();
            Ok(json!({"bookmarked": bookmarked}))
        }
        "bookmark.remove" => {
            let url = str_param(params, "url")?;
            let removed = app.bookmarks.remove(url).map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed}))
        }
        "bookmark.update" => {
            let url = str_param(params, "url")?;
            let title = str_param(params, "title")?;
            app.bookmarks.update(url, title).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.select" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            validate_url(app, url)?;
            let tab_id = app.select_bookmark(title, url);
            Ok(json!({"tab_id": tab_id}))
        }
        "bookmark.mark_broken" => {
            let url = str_param(params, "url")?;
            let broken = bool_param(params, "broken")?;
            app.bookmarks.mark_broken(url, broken).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Preferences ───
        "preferences.get" => {
            let enabled = app.preferences.persistence_enabled().map_err(|e| e.to_string())?;
            Ok(json!({"persistence_enabled": enabled}))
        }
        "preferences.set_persistence" => {
            let enabled = bool_param(params, "enabled")?;
            app.preferences
                .set_persistence_enabled(enabled)
                .map_err(|e| e.to_string())?;
            Ok(json!({"persistence_enabled": enabled}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
