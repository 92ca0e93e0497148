//! SideTabs RPC Server: JSON-RPC over stdin/stdout for the extension page.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.add", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"render",...}, {"event":"frame",...}, {"event":"bookmarks",...}
//!
//! Logs go to stderr so stdout carries nothing but protocol lines.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use sidetabs::app::{wait_until, App, AppStorage};
use sidetabs::database::Database;
use sidetabs::rpc_handler::handle_method;
use sidetabs::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use sidetabs::types::bookmark::Bookmark;
use sidetabs::types::frame::FrameCommand;
use sidetabs::types::tab::Tab;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
        log::warn!("failed to write to stdout");
    }
}

/// SIDETABS_DATA_DIR if set, otherwise the directory holding the executable.
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SIDETABS_DATA_DIR") {
        PathBuf::from(dir)
    } else if let Ok(exe) = std::env::current_exe() {
        exe.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(".")
    }
}

fn handle_line(app: &mut App, rate_limiter: &mut RateLimiter, line: &str) {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
            return;
        }
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);

    if !rate_limiter.check() {
        emit(&json!({"id": id, "error": "rate limit exceeded"}));
        return;
    }

    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    let response = match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    };
    emit(&response);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = data_dir();
    let mut settings_engine = SettingsEngine::in_dir(&dir);
    let settings = settings_engine.load().unwrap_or_else(|e| {
        log::warn!("using default settings: {}", e);
        settings_engine.get_settings().clone()
    });

    let storage = match Database::open(dir.join("sidetabs.db")) {
        Ok(db) => AppStorage::sqlite(Arc::new(db)),
        Err(e) => {
            log::warn!("failed to open database, state will not persist: {}", e);
            AppStorage::in_memory()
        }
    };

    let frames = Box::new(|command: FrameCommand| {
        emit(&json!({"event": "frame", "command": command}));
    });
    let mut app = App::new(settings, storage, frames);
    app.subscribe_render(Box::new(|tabs: &[Tab], active: Option<&str>| {
        emit(&json!({"event": "render", "tabs": tabs, "active_tab_id": active}));
    }));
    app.subscribe_bookmarks(Box::new(|bookmarks: &[Bookmark]| {
        emit(&json!({"event": "bookmarks", "bookmarks": bookmarks}));
    }));

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    app.startup();

    // Rate limiting: max 200 RPC requests per second
    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = app.next_drain_deadline();
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !line.trim().is_empty() {
                        handle_line(&mut app, &mut rate_limiter, &line);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("stdin read failed: {}", e);
                    break;
                }
            },
            _ = wait_until(deadline) => {
                app.drain_tick();
            }
        }
    }

    app.shutdown();
}
