//! Detection of bookmarked conversations that no longer open.
//!
//! When a conversation link is dead the chat app silently redirects to its
//! "new chat" page. The content script flags such redirects as automatic, and
//! this module decides whether the redirect means the intended link is broken.

use url::Url;

/// Paths of the chat app's "new chat" page.
const NEW_CHAT_PATHS: [&str; 2] = ["/app", "/app/"];

/// Returns true if an automatic redirect away from `intended_url` indicates a dead link.
///
/// A redirect is only suspicious when the user did not ask for a new chat in
/// the first place. Unparseable urls are never reported as broken.
pub fn is_broken_link(is_auto_redirect: bool, intended_url: Option<&str>) -> bool {
    if !is_auto_redirect {
        return false;
    }
    let Some(intended) = intended_url.filter(|u| !u.is_empty()) else {
        return false;
    };

    match Url::parse(intended) {
        Ok(parsed) => !NEW_CHAT_PATHS.contains(&parsed.path()),
        Err(e) => {
            log::debug!("ignoring unparseable intended url {}: {}", intended, e);
            false
        }
    }
}
