//! Unit tests for the popup/new-window bridge, on its own and wired into
//! `App`.

use std::thread::sleep;

use suma::app::App;
use suma::config::AppConfig;
use suma::host::NotificationHost;
use suma::managers::popup_bridge::{PopupBridge, PopupOrigin, DEDUP_WINDOW};
use suma::managers::tab_manager::{TabSessionStore, TabSessionStoreTrait};
use suma::navigation::content_view::{ContentView, HeadlessViewFactory, ViewCommand};
use suma::navigation::reconciler::EventOutcome;
use suma::types::navigation::{ContentEvent, ViewId};

fn app() -> App<HeadlessViewFactory> {
    let config = AppConfig {
        start_url: Some("example.com".into()),
        ..AppConfig::default()
    };
    App::in_memory(&config, HeadlessViewFactory::default()).unwrap()
}

#[test]
fn test_each_request_opens_exactly_one_tab() {
    let mut store = TabSessionStore::new(None);
    let mut bridge = PopupBridge::new();
    let sender = bridge.sender();
    sender.request("https://a.example/", PopupOrigin::SameWindow, Some(ViewId(1)));
    sender.request("https://b.example/", PopupOrigin::SameWindow, Some(ViewId(1)));

    let outcome = bridge.drain(&mut store);
    assert_eq!(outcome.opened.len(), 2);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get_active().url, "https://b.example/");
}

#[test]
fn test_repeat_after_dedup_window_opens_again() {
    let mut store = TabSessionStore::new(None);
    let mut bridge = PopupBridge::new();
    let sender = bridge.sender();
    sender.request("https://a.example/", PopupOrigin::SameWindow, Some(ViewId(1)));
    bridge.drain(&mut store);

    sleep(DEDUP_WINDOW);
    sender.request("https://a.example/", PopupOrigin::SameWindow, Some(ViewId(1)));
    assert_eq!(bridge.drain(&mut store).opened.len(), 1);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_script_urls_are_refused() {
    let mut store = TabSessionStore::new(None);
    let mut bridge = PopupBridge::new();
    bridge
        .sender()
        .request("JavaScript:alert(1)", PopupOrigin::SameWindow, None);
    assert!(bridge.drain(&mut store).is_empty());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_blank_popup_opens_blank_tab() {
    let mut store = TabSessionStore::new(None);
    let mut bridge = PopupBridge::new();
    bridge.sender().request("", PopupOrigin::SameWindow, None);
    let outcome = bridge.drain(&mut store);
    assert_eq!(outcome.opened.len(), 1);
    assert!(store.get_active().is_blank());
}

#[test]
fn test_repeated_host_request_opens_a_tab_each_time() {
    let mut app = app();
    app.open_popup("https://a.example/", PopupOrigin::SameWindow);
    app.open_popup("https://a.example/", PopupOrigin::SameWindow);
    assert_eq!(app.store.len(), 3);
}

#[test]
fn test_double_reported_view_request_opens_one_tab() {
    let mut store = TabSessionStore::new(None);
    let mut bridge = PopupBridge::new();
    let sender = bridge.sender();
    sender.request("https://a.example/", PopupOrigin::SameWindow, Some(ViewId(3)));
    sender.request("https://a.example/", PopupOrigin::SameWindow, Some(ViewId(3)));
    assert_eq!(bridge.drain(&mut store).opened.len(), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_guest_new_window_becomes_loading_tab() {
    let mut app = app();
    let opener = app.store.active_id().clone();
    let view = app.slot(&opener).unwrap().view.id();
    app.take_view_commands();

    let outcome = app.dispatch_view_event(view, ContentEvent::NewWindow { url: "https://popup.example/".into() });
    assert_eq!(outcome, EventOutcome::DefaultPrevented);
    assert_eq!(app.store.len(), 2);

    let popup = app.store.active_id().clone();
    assert_ne!(popup, opener);
    let popup_view = app.slot(&popup).unwrap().view.id();
    assert_eq!(
        app.take_view_commands(),
        vec![(popup_view, ViewCommand::Load { url: "https://popup.example/".into() })]
    );
}

#[test]
fn test_cross_window_request_reaches_host() {
    let mut app = app();
    app.open_popup("https://elsewhere.example/", PopupOrigin::CrossWindow);
    assert_eq!(app.store.len(), 1);

    let mut host = NotificationHost::new();
    app.flush_host(&mut host);
    let events = host.take();
    let window = events
        .iter()
        .find(|e| e["event"] == "window.open")
        .expect("window.open notification");
    assert_eq!(window["data"]["url"], "https://elsewhere.example/");

    app.flush_host(&mut host);
    assert!(host.take().is_empty());
}
