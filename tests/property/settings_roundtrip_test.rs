//! Property-based tests for settings save → load round-trip.

use proptest::prelude::*;
use sidetabs::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use sidetabs::types::settings::{
    BookmarkSettings, PanelSettings, PersistenceSettings, SchedulerSettings, TabSettings,
};
use tempfile::TempDir;

fn arb_settings() -> impl Strategy<Value = PanelSettings> {
    (
        "[A-Za-z ]{1,20}",
        "https://[a-z]{3,12}\\.com/[a-z]{0,10}",
        1i64..1_000_000_000,
        prop::collection::vec("[a-z]{2,10}://", 0..4),
        0u64..10_000,
        1u64..60_000,
        any::<bool>(),
    )
        .prop_map(
            |(title, url, limit, prefixes, debounce, drain, reset)| PanelSettings {
                tabs: TabSettings {
                    default_title: title,
                    default_url: url,
                    inactivity_limit_ms: limit,
                    internal_url_prefixes: prefixes,
                },
                persistence: PersistenceSettings {
                    save_debounce_ms: debounce,
                },
                scheduler: SchedulerSettings {
                    drain_period_ms: drain,
                },
                bookmarks: BookmarkSettings {
                    reset_broken_on_startup: reset,
                },
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_save_load_roundtrip(settings in arb_settings()) {
        let dir = TempDir::new().unwrap();
        let mut engine = SettingsEngine::in_dir(dir.path());
        engine.update(settings.clone()).unwrap();

        let mut reader = SettingsEngine::in_dir(dir.path());
        let loaded = reader.load().unwrap();
        prop_assert_eq!(loaded, settings);
    }
}
