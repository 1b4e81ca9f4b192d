//! Unit tests for the tab session store through its public trait.
//!
//! Covers close/activate neighbor selection, field updates and the
//! pointer-identity guarantee for updates that change nothing.

use std::sync::Arc;

use suma::managers::tab_manager::{TabSessionStore, TabSessionStoreTrait};
use suma::types::tab::{Favicon, TabId, TabPatch, NEW_TAB_TITLE};

/// Store with tabs [A, B, C], where A is the seeded first tab.
fn three_tabs() -> (TabSessionStore, TabId, TabId, TabId) {
    let mut store = TabSessionStore::new(Some("a.example"));
    let a = store.active_id().clone();
    let b = store.create_tab(Some("b.example"));
    let c = store.create_tab(Some("c.example"));
    (store, a, b, c)
}

#[test]
fn test_create_does_not_activate() {
    let (store, a, _, c) = three_tabs();
    assert_eq!(store.len(), 3);
    assert_eq!(store.active_id(), &a);
    assert_eq!(store.index_of(&c), Some(2));
}

#[test]
fn test_closing_the_only_tab_is_a_noop() {
    let mut store = TabSessionStore::new(None);
    let only = store.active_id().clone();
    let before = store.snapshot();
    assert!(!store.close_tab(&only));
    assert_eq!(store.len(), 1);
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn test_close_active_middle_tab_activates_right_neighbor() {
    let (mut store, _, b, c) = three_tabs();
    store.activate_tab(&b);
    assert!(store.close_tab(&b));
    assert_eq!(store.active_id(), &c);
}

#[test]
fn test_close_active_last_tab_activates_left_neighbor() {
    let mut store = TabSessionStore::new(Some("a.example"));
    let a = store.active_id().clone();
    let b = store.create_tab(Some("b.example"));
    store.activate_tab(&b);
    assert!(store.close_tab(&b));
    assert_eq!(store.active_id(), &a);
}

#[test]
fn test_close_inactive_tab_keeps_active() {
    let (mut store, a, b, _) = three_tabs();
    assert!(store.close_tab(&b));
    assert_eq!(store.active_id(), &a);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_activate_same_tab_changes_nothing() {
    let (mut store, a, _, _) = three_tabs();
    let revision = store.revision();
    assert!(!store.activate_tab(&a));
    assert_eq!(store.revision(), revision);
}

#[test]
fn test_update_with_identical_values_keeps_pointers() {
    let (mut store, a, _, _) = three_tabs();
    let tab = store.get(&a).unwrap();
    let before = store.snapshot();
    let patch = TabPatch::title(tab.title.clone()).with_loading(tab.loading);
    assert!(!store.update_field(&a, patch));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert!(Arc::ptr_eq(&tab, &store.get(&a).unwrap()));
}

#[test]
fn test_update_replaces_only_the_touched_record() {
    let (mut store, a, b, _) = three_tabs();
    let untouched = store.get(&b).unwrap();
    assert!(store.update_field(&a, TabPatch::title("Alpha")));
    assert_eq!(store.get(&a).unwrap().title, "Alpha");
    assert!(Arc::ptr_eq(&untouched, &store.get(&b).unwrap()));
}

#[test]
fn test_blank_url_resets_tab() {
    let (mut store, a, _, _) = three_tabs();
    store.update_field(
        &a,
        TabPatch::title("Alpha")
            .with_loading(true)
            .with_favicon(Favicon::Source("https://a.example/favicon.ico".into())),
    );
    assert!(store.update_field(&a, TabPatch::url("")));
    let tab = store.get(&a).unwrap();
    assert!(tab.is_blank());
    assert_eq!(tab.title, NEW_TAB_TITLE);
    assert_eq!(tab.favicon, Favicon::Default);
    assert!(!tab.loading);
}

#[test]
fn test_blank_title_is_ignored() {
    let (mut store, a, _, _) = three_tabs();
    assert!(!store.update_field(&a, TabPatch::title("   ")));
    assert_eq!(store.get(&a).unwrap().title, "a.example");
}

#[test]
fn test_url_update_is_canonicalized() {
    let (mut store, a, _, _) = three_tabs();
    store.update_field(&a, TabPatch::url("HTTPS://Example.COM/x"));
    assert_eq!(store.get(&a).unwrap().url, "https://example.com/x");
}
