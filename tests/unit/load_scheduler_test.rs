use std::sync::{Arc, Mutex};
use std::time::Duration;

use sidetabs::managers::load_scheduler::{classify, FrameHost, LoadScheduler, TabClass};
use sidetabs::types::frame::FrameCommand;
use sidetabs::types::tab::Tab;
use tokio::time::Instant;

const HOUR_MS: i64 = 60 * 60 * 1000;
const LIMIT_MS: i64 = 2 * HOUR_MS;
const NOW_MS: i64 = 1_700_000_000_000;
const PERIOD: Duration = Duration::from_millis(1500);

type Log = Arc<Mutex<Vec<FrameCommand>>>;

fn scheduler() -> (LoadScheduler, Log) {
    let log: Log = Arc::default();
    let sink = log.clone();
    let host: Box<dyn FrameHost> = Box::new(move |command: FrameCommand| {
        sink.lock().unwrap().push(command);
    });
    (LoadScheduler::new(host, PERIOD, LIMIT_MS), log)
}

fn tab(id: &str, idle_ms: i64) -> Tab {
    Tab {
        id: id.to_string(),
        title: id.to_uppercase(),
        url: format!("https://gemini.google.com/app/{}", id),
        last_active: NOW_MS - idle_ms,
    }
}

fn load(id: &str) -> FrameCommand {
    FrameCommand::Load {
        tab_id: id.to_string(),
        url: format!("https://gemini.google.com/app/{}", id),
    }
}

fn unload(id: &str) -> FrameCommand {
    FrameCommand::Unload { tab_id: id.to_string() }
}

fn current(id: &str, current: bool) -> FrameCommand {
    FrameCommand::SetCurrent { tab_id: id.to_string(), current }
}

fn take(log: &Log) -> Vec<FrameCommand> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[test]
fn test_classify() {
    let a = tab("a", 3 * HOUR_MS);
    assert_eq!(classify(&a, Some("a"), NOW_MS, LIMIT_MS), TabClass::Active);
    assert_eq!(classify(&a, Some("b"), NOW_MS, LIMIT_MS), TabClass::Stale);
    assert_eq!(classify(&tab("b", LIMIT_MS), None, NOW_MS, LIMIT_MS), TabClass::Recent);
    assert_eq!(classify(&tab("b", LIMIT_MS + 1), None, NOW_MS, LIMIT_MS), TabClass::Stale);
}

#[test]
fn test_active_loads_recent_queues_stale_stays_unloaded() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    let tabs = vec![tab("a", 0), tab("b", HOUR_MS), tab("c", 3 * HOUR_MS)];

    s.reconcile_at(&tabs, Some("a"), NOW_MS, now);

    assert_eq!(take(&log), vec![load("a"), current("a", true)]);
    assert!(s.is_loaded("a"));
    assert!(s.is_queued("b"));
    assert!(!s.is_loaded("c") && !s.is_queued("c"));
    assert_eq!(s.next_drain_deadline(), Some(now + PERIOD));

    assert_eq!(s.drain_tick(now + PERIOD), Some("b".to_string()));
    assert_eq!(take(&log), vec![load("b")]);
    assert!(s.is_loaded("b"));
    assert!(!s.is_queued("b"));
    assert!(s.is_draining());

    // next tick finds the queue empty and stops the drain
    assert_eq!(s.drain_tick(now + PERIOD * 2), None);
    assert!(!s.is_draining());
    assert!(take(&log).is_empty());
    assert!(!s.is_loaded("c"));
}

#[test]
fn test_drain_loads_one_tab_per_tick_in_queue_order() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    let tabs = vec![tab("a", 0), tab("b", HOUR_MS), tab("c", HOUR_MS)];
    s.reconcile_at(&tabs, Some("a"), NOW_MS, now);
    take(&log);

    assert_eq!(s.queued().collect::<Vec<_>>(), vec!["b", "c"]);
    assert_eq!(s.drain_tick(now + PERIOD), Some("b".to_string()));
    assert_eq!(s.next_drain_deadline(), Some(now + PERIOD * 2));
    assert_eq!(s.drain_tick(now + PERIOD * 2), Some("c".to_string()));
    assert_eq!(take(&log), vec![load("b"), load("c")]);
}

#[test]
fn test_repeated_reconcile_does_not_restart_drain() {
    let (mut s, _log) = scheduler();
    let now = Instant::now();
    let tabs = vec![tab("a", 0), tab("b", HOUR_MS)];

    s.reconcile_at(&tabs, Some("a"), NOW_MS, now);
    s.reconcile_at(&tabs, Some("a"), NOW_MS, now + Duration::from_millis(700));

    assert_eq!(s.next_drain_deadline(), Some(now + PERIOD));
    assert_eq!(s.queued().count(), 1);
}

#[test]
fn test_tab_removed_while_queued_is_never_loaded() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    s.reconcile_at(&[tab("a", 0), tab("b", HOUR_MS)], Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&[tab("a", 0)], Some("a"), NOW_MS, now);
    assert!(!s.is_queued("b"));

    assert_eq!(s.drain_tick(now + PERIOD), None);
    assert!(take(&log).is_empty());
}

#[test]
fn test_queued_tab_turning_stale_is_dequeued() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    let tabs = vec![tab("a", 0), tab("b", HOUR_MS)];
    s.reconcile_at(&tabs, Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&tabs, Some("a"), NOW_MS + 2 * HOUR_MS, now);
    assert!(!s.is_queued("b"));
    assert_eq!(s.drain_tick(now + PERIOD), None);
    assert!(!s.is_loaded("b"));
}

#[test]
fn test_switching_tabs_moves_current_flag() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    let tabs = vec![tab("a", 0), tab("b", 0)];
    s.reconcile_at(&tabs, Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&tabs, Some("b"), NOW_MS, now);

    // b was queued behind a; activating it loads it right away
    assert_eq!(take(&log), vec![load("b"), current("a", false), current("b", true)]);
    assert!(!s.is_queued("b"));
    assert!(s.is_loaded("a"));
}

#[test]
fn test_stale_loaded_tab_is_unloaded() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    s.reconcile_at(&[tab("a", 0), tab("b", 0)], Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&[tab("a", 3 * HOUR_MS), tab("b", 0)], Some("b"), NOW_MS, now);

    assert_eq!(take(&log), vec![unload("a"), load("b"), current("b", true)]);
    assert!(!s.is_loaded("a"));
}

#[test]
fn test_removed_loaded_tab_is_unloaded() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    s.reconcile_at(&[tab("a", 0), tab("b", 3 * HOUR_MS)], Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&[tab("b", 3 * HOUR_MS)], Some("b"), NOW_MS, now);

    let commands = take(&log);
    assert_eq!(commands[0], unload("a"));
    assert!(commands.contains(&load("b")));
    assert_eq!(s.loaded_ids().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn test_no_active_tab_clears_current() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    s.reconcile_at(&[tab("a", 0)], Some("a"), NOW_MS, now);
    take(&log);

    s.reconcile_at(&[tab("a", 0)], None, NOW_MS, now);
    assert_eq!(take(&log), vec![current("a", false)]);
    assert!(s.is_loaded("a"));
}

#[test]
fn test_loaded_url_is_not_reloaded_on_navigation() {
    let (mut s, log) = scheduler();
    let now = Instant::now();
    s.reconcile_at(&[tab("a", 0)], Some("a"), NOW_MS, now);
    take(&log);

    let mut moved = tab("a", 0);
    moved.url = "https://gemini.google.com/app/elsewhere".to_string();
    s.reconcile_at(&[moved], Some("a"), NOW_MS, now);

    assert!(take(&log).is_empty());
    assert_eq!(s.loaded_url("a"), Some("https://gemini.google.com/app/a"));
}
