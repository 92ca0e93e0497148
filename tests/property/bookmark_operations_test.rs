//! Property-based tests for bookmark operations.
//!
//! Bookmarks are keyed by url: for any sequence of toggles, adds and removes
//! there is at most one bookmark per url and membership matches a set model.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use sidetabs::database::MemoryStorage;
use sidetabs::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};

#[derive(Debug, Clone)]
enum BookmarkOp {
    Toggle(usize),
    Add(usize),
    Remove(usize),
    MarkBroken(usize, bool),
}

fn url(idx: usize) -> String {
    format!("https://gemini.google.com/app/conv{}", idx % 5)
}

fn arb_ops() -> impl Strategy<Value = Vec<BookmarkOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..5usize).prop_map(BookmarkOp::Toggle),
            2 => (0..5usize).prop_map(BookmarkOp::Add),
            2 => (0..5usize).prop_map(BookmarkOp::Remove),
            1 => (0..5usize, any::<bool>()).prop_map(|(i, b)| BookmarkOp::MarkBroken(i, b)),
        ],
        1..50,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn at_most_one_bookmark_per_url(ops in arb_ops()) {
        let storage = Arc::new(MemoryStorage::new());
        let mut mgr = BookmarkManager::new(storage.clone());
        let mut model: HashSet<String> = HashSet::new();

        for op in &ops {
            match op {
                BookmarkOp::Toggle(i) => {
                    let bookmarked = mgr.toggle("Chat", &url(*i)).unwrap();
                    let expected = if model.remove(&url(*i)) {
                        false
                    } else {
                        model.insert(url(*i))
                    };
                    prop_assert_eq!(bookmarked, expected);
                }
                BookmarkOp::Add(i) => {
                    let added = mgr.add("Chat", &url(*i)).unwrap();
                    prop_assert_eq!(added, model.insert(url(*i)));
                }
                BookmarkOp::Remove(i) => {
                    let removed = mgr.remove(&url(*i)).unwrap();
                    prop_assert_eq!(removed, model.remove(&url(*i)));
                }
                BookmarkOp::MarkBroken(i, broken) => {
                    mgr.mark_broken(&url(*i), *broken).unwrap();
                    if model.contains(&url(*i)) {
                        prop_assert_eq!(mgr.get_bookmark(&url(*i)).unwrap().broken, *broken);
                    }
                }
            }

            let urls: HashSet<&str> = mgr.get_bookmarks().iter().map(|b| b.url.as_str()).collect();
            prop_assert_eq!(urls.len(), mgr.get_bookmarks().len());
            prop_assert_eq!(urls.len(), model.len());
            prop_assert!(model.iter().all(|u| mgr.is_bookmarked(u)));
        }

        let mut reloaded = BookmarkManager::new(storage);
        reloaded.init().unwrap();
        prop_assert_eq!(reloaded.get_bookmarks(), mgr.get_bookmarks());
    }
}
