//! Integration tests for the navigation reconciler.
//!
//! A single reconciler is driven against a headless view for the
//! per-tab rules; multi-tab behavior goes through `App`.

use std::time::{Duration, Instant};

use serde_json::json;

use suma::app::App;
use suma::config::AppConfig;
use suma::managers::popup_bridge::PopupBridge;
use suma::managers::tab_manager::{TabSessionStore, TabSessionStoreTrait};
use suma::navigation::bus::NavigationBus;
use suma::navigation::content_view::{ContentView, HeadlessView, HeadlessViewFactory, ViewCommand};
use suma::navigation::reconciler::{EventOutcome, NavigationReconciler};
use suma::navigation::router::EventRouter;
use suma::navigation::state::{ReconcilerPhase, TOAST_TTL};
use suma::types::navigation::{ContentEvent, NavCommand, NavigationIntent, ViewId, ABORTED_ERROR_CODE};
use suma::types::tab::Favicon;

struct Harness {
    store: TabSessionStore,
    view: HeadlessView,
    reconciler: NavigationReconciler,
    _router: EventRouter,
    _bus: NavigationBus,
    _popups: PopupBridge,
}

fn harness() -> Harness {
    let store = TabSessionStore::new(None);
    let bus = NavigationBus::new();
    let popups = PopupBridge::new();
    let router = EventRouter::new();
    let view = HeadlessView::new(ViewId(7));
    let mut reconciler =
        NavigationReconciler::new(store.active_id().clone(), bus.subscribe(), popups.sender());
    reconciler.bind(&router, view.id());
    reconciler.set_active(true);
    Harness {
        store,
        view,
        reconciler,
        _router: router,
        _bus: bus,
        _popups: popups,
    }
}

impl Harness {
    fn go(&mut self, input: &str) {
        self.reconciler
            .navigate(&mut self.store, &mut self.view, NavigationIntent::typed(input));
    }

    fn emit(&mut self, event: ContentEvent) -> EventOutcome {
        self.view.observe(&event);
        self.reconciler.handle_event(&mut self.store, &mut self.view, event)
    }

    fn fail(&mut self, code: i32, url: &str) -> EventOutcome {
        self.emit(ContentEvent::FailLoad {
            is_main_frame: true,
            error_code: code,
            description: "ERR_NAME_NOT_RESOLVED".into(),
            validated_url: url.into(),
        })
    }

    fn commit(&mut self, url: &str) {
        self.emit(ContentEvent::StartLoading);
        self.emit(ContentEvent::StartNavigation { url: url.into(), is_main_frame: true });
        self.emit(ContentEvent::DidNavigate { url: url.into() });
    }

    fn phase(&self) -> ReconcilerPhase {
        self.reconciler.phase(&self.store)
    }
}

// ─── Failures ───

#[test]
fn test_aborted_load_never_shows_error() {
    let mut h = harness();
    h.go("example.com");
    h.emit(ContentEvent::StartLoading);
    assert_eq!(h.fail(ABORTED_ERROR_CODE, "https://example.com/"), EventOutcome::Applied);
    assert!(h.reconciler.failure().is_none());
    assert!(h.reconciler.toast_message().is_none());
    assert!(!h.store.get_active().loading);
    assert_eq!(h.phase(), ReconcilerPhase::Loaded);
}

#[test]
fn test_subframe_failure_is_ignored() {
    let mut h = harness();
    h.go("example.com");
    let outcome = h.emit(ContentEvent::FailLoad {
        is_main_frame: false,
        error_code: -105,
        description: "ERR_NAME_NOT_RESOLVED".into(),
        validated_url: "https://ads.example.net/".into(),
    });
    assert_eq!(outcome, EventOutcome::Ignored);
    assert!(h.reconciler.failure().is_none());
}

#[test]
fn test_www_retry_happens_once_then_error() {
    let mut h = harness();
    h.go("example.com");
    h.view.take_commands();

    h.fail(-105, "https://example.com/");
    assert_eq!(
        h.view.take_commands(),
        vec![ViewCommand::Load { url: "https://www.example.com/".into() }]
    );
    assert!(h.reconciler.failure().is_none());
    let toast = h.reconciler.toast_message().unwrap_or_default().to_string();
    assert!(toast.contains("www.example.com"), "unexpected toast: {toast}");

    h.fail(-105, "https://www.example.com/");
    assert!(h.view.take_commands().is_empty());
    let failure = h.reconciler.failure().cloned().unwrap();
    assert_eq!(failure.error_code, -105);
    assert_eq!(failure.url, "https://www.example.com/");
    assert_eq!(h.phase(), ReconcilerPhase::Failed);
}

#[test]
fn test_same_host_is_not_retried_twice() {
    let mut h = harness();
    h.go("example.com");
    h.fail(-105, "https://example.com/");
    h.fail(-105, "https://www.example.com/");

    h.go("example.com");
    h.view.take_commands();
    h.fail(-105, "https://example.com/");
    assert!(h.view.take_commands().is_empty());
    assert!(h.reconciler.failure().is_some());
}

#[test]
fn test_new_host_gets_its_own_retry() {
    let mut h = harness();
    h.go("example.com");
    h.fail(-105, "https://example.com/");
    h.fail(-105, "https://www.example.com/");

    h.go("other.org");
    h.view.take_commands();
    h.fail(-105, "https://other.org/");
    assert_eq!(
        h.view.take_commands(),
        vec![ViewCommand::Load { url: "https://www.other.org/".into() }]
    );
}

#[test]
fn test_toast_expires_on_tick() {
    let mut h = harness();
    h.go("example.com");
    h.fail(-105, "https://example.com/");
    assert!(h.reconciler.toast_message().is_some());

    assert!(!h.reconciler.tick(Instant::now()));
    assert!(h.reconciler.tick(Instant::now() + TOAST_TTL + Duration::from_secs(1)));
    assert!(h.reconciler.toast_message().is_none());
}

// ─── Superseded navigations ───

/// Leaves the harness committed on `a-site.com` with a cross-host navigation
/// to `b-site.org` started but not yet committed.
fn superseded(h: &mut Harness) {
    h.go("a-site.com");
    h.commit("https://a-site.com/");
    h.go("b-site.org");
    h.emit(ContentEvent::StartLoading);
    h.emit(ContentEvent::StartNavigation { url: "https://b-site.org/".into(), is_main_frame: true });
    h.view.take_commands();
}

#[test]
fn test_late_failure_of_previous_host_is_ignored() {
    let mut h = harness();
    h.go("a-site.com");
    h.emit(ContentEvent::StartLoading);
    h.go("b-site.org");
    h.emit(ContentEvent::StartLoading);
    h.emit(ContentEvent::StartNavigation { url: "https://b-site.org/".into(), is_main_frame: true });
    h.view.take_commands();

    assert_eq!(h.fail(-105, "https://a-site.com/"), EventOutcome::Ignored);
    assert!(h.view.take_commands().is_empty());
    assert!(h.reconciler.failure().is_none());
    assert!(h.reconciler.toast_message().is_none());
    assert_eq!(h.store.get_active().url, "https://b-site.org/");
    assert_eq!(h.phase(), ReconcilerPhase::Loading);
}

#[test]
fn test_late_failure_of_retried_host_is_ignored() {
    let mut h = harness();
    h.go("example.com");
    h.fail(-105, "https://example.com/");
    h.view.take_commands();

    assert_eq!(h.fail(-105, "https://example.com/"), EventOutcome::Ignored);
    assert!(h.reconciler.failure().is_none());
    assert_eq!(h.store.get_active().url, "https://www.example.com/");
}

#[test]
fn test_late_finish_keeps_new_navigation_loading() {
    let mut h = harness();
    superseded(&mut h);

    assert_eq!(h.emit(ContentEvent::FinishLoading), EventOutcome::Ignored);
    assert!(h.store.get_active().loading);
    assert_eq!(h.phase(), ReconcilerPhase::Loading);
    assert!(h.reconciler.aux().probe.is_none());

    h.emit(ContentEvent::DidNavigate { url: "https://b-site.org/".into() });
    assert_eq!(h.emit(ContentEvent::FinishLoading), EventOutcome::Applied);
    assert!(!h.store.get_active().loading);
    assert!(h.reconciler.aux().probe.is_some());
    assert!(h
        .view
        .take_commands()
        .iter()
        .any(|c| matches!(c, ViewCommand::ExecuteScript { .. })));
}

#[test]
fn test_late_abort_keeps_new_navigation_loading() {
    let mut h = harness();
    superseded(&mut h);

    assert_eq!(h.fail(ABORTED_ERROR_CODE, "https://a-site.com/"), EventOutcome::Ignored);
    assert!(h.store.get_active().loading);
    assert_eq!(h.phase(), ReconcilerPhase::Loading);

    assert_eq!(h.fail(ABORTED_ERROR_CODE, "https://b-site.org/"), EventOutcome::Applied);
    assert!(!h.store.get_active().loading);
}

#[test]
fn test_failure_after_redirect_to_other_host_is_current() {
    let mut h = harness();
    h.go("short.example");
    h.emit(ContentEvent::StartLoading);
    h.emit(ContentEvent::Redirect { url: "https://landing.example.net/".into(), is_main_frame: true });

    h.fail(-106, "https://landing.example.net/");
    h.fail(-106, "https://www.landing.example.net/");
    assert_eq!(h.phase(), ReconcilerPhase::Failed);
}

// ─── Favicons ───

#[test]
fn test_favicon_from_previous_host_is_ignored() {
    let mut h = harness();
    h.go("example.com");
    h.commit("https://example.com/");
    h.emit(ContentEvent::FaviconUpdated { favicons: vec![json!("/a.png")] });
    assert_eq!(
        h.store.get_active().favicon,
        Favicon::Source("https://example.com/a.png".into())
    );

    h.go("other.org");
    let stale = h.emit(ContentEvent::FaviconUpdated { favicons: vec![json!("/stale.png")] });
    assert_eq!(stale, EventOutcome::Ignored);
    assert_eq!(
        h.store.get_active().favicon,
        Favicon::Source("https://example.com/a.png".into())
    );

    h.commit("https://other.org/");
    h.emit(ContentEvent::FaviconUpdated { favicons: vec![json!("/b.png")] });
    assert_eq!(
        h.store.get_active().favicon,
        Favicon::Source("https://other.org/b.png".into())
    );
}

#[test]
fn test_stale_probe_result_is_ignored() {
    let mut h = harness();
    h.go("example.com");
    h.commit("https://example.com/");
    h.emit(ContentEvent::FinishLoading);
    let ticket = h.reconciler.aux().probe.as_ref().map(|p| p.ticket).unwrap();

    h.go("other.org");
    let outcome = h.emit(ContentEvent::ScriptResult { ticket, result: Ok(json!(["/old.png"])) });
    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(h.store.get_active().favicon, Favicon::Default);
}

#[test]
fn test_probe_unavailable_falls_back_to_root_favicon() {
    let mut h = harness();
    h.view.reject_scripts(true);
    h.go("example.com");
    h.commit("https://example.com/");
    h.emit(ContentEvent::FinishLoading);
    assert_eq!(
        h.store.get_active().favicon,
        Favicon::Source("https://example.com/favicon.ico".into())
    );
}

// ─── Location and blank tabs ───

#[test]
fn test_redirect_updates_url() {
    let mut h = harness();
    h.go("http://example.com");
    h.emit(ContentEvent::Redirect { url: "https://example.com/home".into(), is_main_frame: true });
    assert_eq!(h.store.get_active().url, "https://example.com/home");
}

#[test]
fn test_events_on_blank_tab_are_dropped() {
    let mut h = harness();
    assert_eq!(h.phase(), ReconcilerPhase::Blank);
    assert_eq!(h.emit(ContentEvent::StartLoading), EventOutcome::Ignored);
    assert!(!h.store.get_active().loading);
}

#[test]
fn test_empty_submit_returns_to_blank() {
    let mut h = harness();
    h.go("example.com");
    h.go("   ");
    assert_eq!(h.phase(), ReconcilerPhase::Blank);
    assert!(h.store.get_active().is_blank());
}

// ─── Multi-tab ───

fn app_with_two_tabs() -> App<HeadlessViewFactory> {
    let config = AppConfig {
        start_url: Some("a.example".into()),
        ..AppConfig::default()
    };
    let mut app = App::in_memory(&config, HeadlessViewFactory::default()).unwrap();
    app.create_tab(Some("b.example"));
    app.take_view_commands();
    app
}

#[test]
fn test_only_active_reconciler_acts_on_commands() {
    let mut app = app_with_two_tabs();
    let active = app.store.active_id().clone();
    let active_view = app.slot(&active).unwrap().view.id();

    app.publish(NavCommand::Reload);
    assert_eq!(app.take_view_commands(), vec![(active_view, ViewCommand::Reload)]);
}

#[test]
fn test_switching_tabs_moves_command_target() {
    let mut app = app_with_two_tabs();
    let first = app.store.snapshot()[0].id.clone();
    assert!(app.activate_tab(&first));
    let first_view = app.slot(&first).unwrap().view.id();

    app.publish(NavCommand::Navigate("rust-lang.org".into()));
    assert_eq!(
        app.take_view_commands(),
        vec![(first_view, ViewCommand::Load { url: "https://rust-lang.org".into() })]
    );
}

#[test]
fn test_events_for_unknown_views_are_dropped() {
    let mut app = app_with_two_tabs();
    let revision = app.store.revision();
    let outcome = app.dispatch_view_event(ViewId(999), ContentEvent::StartLoading);
    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(app.store.revision(), revision);
}

#[test]
fn test_closed_tab_stops_receiving_events() {
    let mut app = app_with_two_tabs();
    let active = app.store.active_id().clone();
    let view = app.slot(&active).unwrap().view.id();
    let subscribers = app.bus.subscriber_count();
    assert!(app.close_tab(&active));
    assert!(app.router.route(view).is_none());
    assert_eq!(app.bus.subscriber_count(), subscribers - 1);
    assert_eq!(app.dispatch_view_event(view, ContentEvent::StartLoading), EventOutcome::Ignored);
}
