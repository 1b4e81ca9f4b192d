//! Navigation Event Reconciler.
//!
//! One reconciler per tab turns navigation intents into view commands and
//! folds the view's unordered lifecycle events back into the session store.
//! It never blocks: asynchronous results come back as events, and every
//! stateful effect is gated on the current navigation generation so a stale
//! result cannot overwrite a fresher one.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::managers::popup_bridge::{PopupOrigin, PopupSender};
use crate::managers::tab_manager::TabSessionStoreTrait;
use crate::navigation::bus::BusSubscription;
use crate::navigation::content_view::ContentView;
use crate::navigation::favicon::{candidates, first_reported, parse_probe_result, FAVICON_PROBE_SCRIPT};
use crate::navigation::router::{EventRouter, ViewBinding};
use crate::navigation::state::{PendingProbe, ReconcilerPhase, TabAuxState, ToastSlot};
use crate::services::url_normalizer::{
    classify_input, host_of, is_absolute, is_blank, normalize, resolve_against, with_www_prefix,
    InputKind,
};
use crate::types::navigation::{
    ContentEvent, IntentOrigin, LoadFailure, NavCommand, NavigationIntent, NewWindowDisposition,
    ScriptTicket, ViewId, ABORTED_ERROR_CODE, FAILED_ERROR_CODE, INVALID_URL_ERROR_CODE,
};
use crate::types::tab::{Favicon, TabId, TabPatch};

/// What a content event led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// Dropped as stale, irrelevant or unrouted.
    Ignored,
    /// The view must not perform its default handling.
    DefaultPrevented,
}

impl EventOutcome {
    /// How a view should answer the `NewWindow` event that produced this
    /// outcome.
    pub fn new_window_disposition(self) -> NewWindowDisposition {
        match self {
            EventOutcome::DefaultPrevented => NewWindowDisposition::Deny,
            EventOutcome::Applied | EventOutcome::Ignored => NewWindowDisposition::Allow,
        }
    }
}

/// Serializable view of a reconciler for host surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcilerStatus {
    pub tab_id: TabId,
    pub active: bool,
    pub phase: ReconcilerPhase,
    pub failure: Option<LoadFailure>,
    pub toast: Option<String>,
}

pub struct NavigationReconciler {
    tab_id: TabId,
    active: bool,
    binding: Option<ViewBinding>,
    aux: TabAuxState,
    failure: Option<LoadFailure>,
    toast: ToastSlot,
    commands: BusSubscription,
    popups: PopupSender,
    next_ticket: u64,
}

impl NavigationReconciler {
    /// Starts in the blank phase, unbound and inactive.
    pub fn new(tab_id: TabId, commands: BusSubscription, popups: PopupSender) -> Self {
        Self {
            tab_id,
            active: false,
            binding: None,
            aux: TabAuxState {
                blank: true,
                ..TabAuxState::default()
            },
            failure: None,
            toast: ToastSlot::default(),
            commands,
            popups,
            next_ticket: 0,
        }
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        self.failure.as_ref()
    }

    pub fn toast_message(&self) -> Option<&str> {
        self.toast.message()
    }

    pub fn aux(&self) -> &TabAuxState {
        &self.aux
    }

    pub fn bound_view(&self) -> Option<ViewId> {
        self.binding.as_ref().map(ViewBinding::view)
    }

    pub fn phase<S: TabSessionStoreTrait>(&self, store: &S) -> ReconcilerPhase {
        let loading = store.get(&self.tab_id).map(|t| t.loading).unwrap_or(false);
        if self.aux.blank {
            ReconcilerPhase::Blank
        } else if self.failure.is_some() {
            ReconcilerPhase::Failed
        } else if loading {
            ReconcilerPhase::Loading
        } else if self.aux.validating {
            ReconcilerPhase::Validating
        } else {
            ReconcilerPhase::Loaded
        }
    }

    pub fn status<S: TabSessionStoreTrait>(&self, store: &S) -> ReconcilerStatus {
        ReconcilerStatus {
            tab_id: self.tab_id.clone(),
            active: self.active,
            phase: self.phase(store),
            failure: self.failure.clone(),
            toast: self.toast.message().map(str::to_string),
        }
    }

    // ---- listener binding ----

    /// Subscribes to `view`'s events. Binding the same view again is a no-op,
    /// so callers may invoke this on every render.
    pub fn bind(&mut self, router: &EventRouter, view: ViewId) -> bool {
        if self.bound_view() == Some(view) {
            return false;
        }
        self.unbind();
        self.binding = Some(router.bind(view, self.tab_id.clone()));
        debug!(tab = %self.tab_id, %view, "reconciler bound");
        true
    }

    /// Drops the listener group and cancels everything scheduled against it.
    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            self.toast.clear();
            self.aux.probe = None;
            debug!(tab = %self.tab_id, view = %binding.view(), "reconciler unbound");
        }
    }

    /// Dismisses the toast once it has expired.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.toast.tick(now)
    }

    // ---- intents ----

    /// Pre-validates and starts a navigation to `intent.target`.
    pub fn navigate<S, V>(&mut self, store: &mut S, view: &mut V, intent: NavigationIntent)
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        self.toast.clear();
        if intent.origin != IntentOrigin::RetryFallback && self.aux.last_retry_host.is_some() {
            let host = host_of(&normalize(&intent.target));
            if host != self.aux.last_retry_host {
                self.aux.last_retry_host = None;
            }
        }
        self.begin_load(store, view, intent);
    }

    fn begin_load<S, V>(&mut self, store: &mut S, view: &mut V, intent: NavigationIntent)
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        self.failure = None;
        self.aux.supersede();

        let kind = classify_input(&intent.target);
        if kind == InputKind::Blank {
            self.enter_blank(store);
            return;
        }

        let target = normalize(&intent.target);
        self.aux.blank = false;
        self.aux.ambiguous_target = kind == InputKind::Ambiguous;

        // The stored url keeps its last valid value.
        if !is_absolute(&target) {
            self.fail(
                store,
                LoadFailure {
                    error_code: INVALID_URL_ERROR_CODE,
                    description: "Invalid URL".to_string(),
                    url: target,
                },
            );
            return;
        }

        self.aux.favicon_pending = true;
        let host = host_of(&target);
        if host != self.aux.last_host {
            self.aux.awaiting_commit = true;
            self.aux.last_host = host;
        }
        store.update_field(&self.tab_id, TabPatch::url(target.as_str()).with_loading(false));

        self.aux.validating = true;
        match view.load_url(&target) {
            Ok(()) => {
                info!(tab = %self.tab_id, url = %target, origin = ?intent.origin, "navigation started")
            }
            Err(err) if self.aux.ambiguous_target => {
                warn!(tab = %self.tab_id, error = %err, "ambiguous input rejected by view, showing blank");
                self.enter_blank(store);
            }
            Err(err) => self.fail(
                store,
                LoadFailure {
                    error_code: FAILED_ERROR_CODE,
                    description: err.to_string(),
                    url: target,
                },
            ),
        }
    }

    fn enter_blank<S: TabSessionStoreTrait>(&mut self, store: &mut S) {
        self.toast.clear();
        self.failure = None;
        self.aux.supersede();
        self.aux.settle_favicon();
        self.aux.blank = true;
        self.aux.validating = false;
        self.aux.ambiguous_target = false;
        self.aux.awaiting_commit = false;
        self.aux.last_host = None;
        store.update_field(&self.tab_id, TabPatch::url(""));
        debug!(tab = %self.tab_id, "tab is blank");
    }

    fn fail<S: TabSessionStoreTrait>(&mut self, store: &mut S, failure: LoadFailure) {
        warn!(
            tab = %self.tab_id,
            code = failure.error_code,
            url = %failure.url,
            description = %failure.description,
            "load failed"
        );
        self.aux.settle_favicon();
        self.aux.validating = false;
        store.update_field(
            &self.tab_id,
            TabPatch::loading(false).with_favicon(Favicon::Default),
        );
        self.failure = Some(failure);
    }

    // ---- control bus ----

    /// Drains pending bus commands. Inactive reconcilers discard them.
    /// Returns the number of commands acted on.
    pub fn pump_commands<S, V>(&mut self, store: &mut S, view: &mut V) -> usize
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        let commands = self.commands.drain();
        if !self.active {
            return 0;
        }

        let mut acted = 0;
        for command in commands {
            match command {
                NavCommand::Navigate(target) => {
                    self.navigate(store, view, NavigationIntent::typed(target));
                }
                _ if self.aux.blank => {
                    debug!(tab = %self.tab_id, ?command, "ignored on blank tab");
                    continue;
                }
                NavCommand::Reload => match self.failure.clone() {
                    Some(failure) => self.navigate(
                        store,
                        view,
                        NavigationIntent::new(failure.url, IntentOrigin::ProgrammaticRedirect),
                    ),
                    None => view.reload(),
                },
                NavCommand::Back => {
                    if !view.can_go_back() {
                        continue;
                    }
                    view.go_back();
                }
                NavCommand::Forward => {
                    if !view.can_go_forward() {
                        continue;
                    }
                    view.go_forward();
                }
            }
            acted += 1;
        }
        acted
    }

    // ---- lifecycle events ----

    pub fn handle_event<S, V>(&mut self, store: &mut S, view: &mut V, event: ContentEvent) -> EventOutcome
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        if self.bound_view() != Some(view.id()) {
            debug!(tab = %self.tab_id, view = %view.id(), event = event.name(), "event from unbound view dropped");
            return EventOutcome::Ignored;
        }
        if self.aux.blank && !matches!(event, ContentEvent::NewWindow { .. }) {
            debug!(tab = %self.tab_id, event = event.name(), "event on blank tab dropped");
            return EventOutcome::Ignored;
        }

        match event {
            ContentEvent::StartLoading => {
                self.failure = None;
                self.aux.validating = false;
                self.aux.supersede();
                self.aux.favicon_pending = true;
                store.update_field(&self.tab_id, TabPatch::loading(true));
                EventOutcome::Applied
            }
            ContentEvent::FinishLoading => {
                if self.aux.awaiting_commit {
                    debug!(tab = %self.tab_id, "finish from superseded navigation ignored");
                    return EventOutcome::Ignored;
                }
                self.aux.validating = false;
                let mut patch = TabPatch::loading(false);
                patch.title = view.title().filter(|t| !t.trim().is_empty());
                store.update_field(&self.tab_id, patch);
                if self.aux.favicon_pending && self.aux.probe.is_none() {
                    self.start_probe(store, view);
                }
                EventOutcome::Applied
            }
            ContentEvent::FailLoad {
                is_main_frame,
                error_code,
                description,
                validated_url,
            } => self.on_fail(store, view, is_main_frame, error_code, description, validated_url),
            ContentEvent::StartNavigation { url, is_main_frame } => {
                if !is_main_frame {
                    return EventOutcome::Ignored;
                }
                let host = host_of(&url);
                if host.is_some() && host != self.aux.last_host {
                    // Keep the visible icon until the new document commits.
                    self.aux.supersede();
                    self.aux.favicon_pending = true;
                    self.aux.awaiting_commit = true;
                    self.aux.last_host = host;
                }
                EventOutcome::Applied
            }
            ContentEvent::DidNavigate { url } => self.on_location(store, &url, true),
            ContentEvent::LoadCommit { url, is_main_frame: true } => self.on_location(store, &url, true),
            ContentEvent::WillNavigate { url } => self.on_location(store, &url, false),
            ContentEvent::DidNavigateInPage { url, is_main_frame: true }
            | ContentEvent::Redirect { url, is_main_frame: true } => self.on_location(store, &url, false),
            ContentEvent::DidNavigateInPage { .. }
            | ContentEvent::Redirect { .. }
            | ContentEvent::LoadCommit { .. } => EventOutcome::Ignored,
            ContentEvent::FaviconUpdated { favicons } => self.on_favicon(store, view, &favicons),
            ContentEvent::FaviconImageFailed { src } => self.on_favicon_failed(store, view, src),
            ContentEvent::TitleUpdated { title } => {
                if title.trim().is_empty() {
                    return EventOutcome::Ignored;
                }
                store.update_field(&self.tab_id, TabPatch::title(title));
                EventOutcome::Applied
            }
            ContentEvent::NewWindow { url } => {
                info!(tab = %self.tab_id, %url, "new-window intercepted");
                self.popups.request(url, PopupOrigin::SameWindow, Some(view.id()));
                EventOutcome::DefaultPrevented
            }
            ContentEvent::ScriptResult { ticket, result } => self.on_probe_result(store, ticket, result),
        }
    }

    fn on_location<S: TabSessionStoreTrait>(&mut self, store: &mut S, url: &str, commits: bool) -> EventOutcome {
        if is_blank(url) {
            return EventOutcome::Ignored;
        }
        if commits {
            let host = host_of(url);
            if host != self.aux.last_host {
                self.aux.supersede();
                self.aux.favicon_pending = true;
                self.aux.last_host = host;
            }
            self.aux.awaiting_commit = false;
        }
        store.update_field(&self.tab_id, TabPatch::url(url));
        EventOutcome::Applied
    }

    fn on_fail<S, V>(
        &mut self,
        store: &mut S,
        view: &mut V,
        is_main_frame: bool,
        error_code: i32,
        description: String,
        validated_url: String,
    ) -> EventOutcome
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        if !is_main_frame {
            debug!(tab = %self.tab_id, code = error_code, "sub-frame failure ignored");
            return EventOutcome::Ignored;
        }
        if !self.is_current_failure(store, &validated_url) {
            debug!(tab = %self.tab_id, code = error_code, url = %validated_url, "failure from superseded navigation ignored");
            return EventOutcome::Ignored;
        }
        if error_code == ABORTED_ERROR_CODE {
            debug!(tab = %self.tab_id, "navigation aborted");
            self.aux.validating = false;
            store.update_field(&self.tab_id, TabPatch::loading(false));
            return EventOutcome::Applied;
        }

        let failed_url = if validated_url.trim().is_empty() {
            view.url()
                .or_else(|| store.get(&self.tab_id).map(|t| t.url.clone()))
                .unwrap_or_default()
        } else {
            validated_url
        };

        if let Some(host) = host_of(&failed_url) {
            let retried = self.aux.last_retry_host.as_deref() == Some(host.as_str());
            if let Some(fallback) = with_www_prefix(&failed_url).filter(|_| !retried) {
                info!(tab = %self.tab_id, from = %failed_url, to = %fallback, "retrying with www prefix");
                self.aux.last_retry_host = Some(host.clone());
                self.toast
                    .show(format!("Couldn't reach {host}, trying www.{host}"), Instant::now());
                self.begin_load(store, view, NavigationIntent::new(fallback, IntentOrigin::RetryFallback));
                return EventOutcome::Applied;
            }
        }

        let description = if description.trim().is_empty() {
            "Failed to load page".to_string()
        } else {
            description
        };
        self.fail(
            store,
            LoadFailure {
                error_code,
                description,
                url: failed_url,
            },
        );
        EventOutcome::Applied
    }

    /// Whether a main-frame failure reported for `validated_url` belongs to
    /// the navigation the tab is on now: its host is the current target host,
    /// the host shown in the tab, or the `www.` form of either. Failures
    /// without a url, or before any host is known, count as current.
    fn is_current_failure<S: TabSessionStoreTrait>(&self, store: &S, validated_url: &str) -> bool {
        let Some(host) = host_of(validated_url) else {
            return true;
        };
        let shown = store.get(&self.tab_id).and_then(|t| host_of(&t.url));
        let mut current = self.aux.last_host.iter().chain(shown.iter()).peekable();
        if current.peek().is_none() {
            return true;
        }
        current.any(|c| *c == host || host.strip_prefix("www.") == Some(c.as_str()))
    }

    // ---- favicon resolution ----

    fn page_url<S, V>(&self, store: &S, view: &V) -> String
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        view.url()
            .filter(|u| !is_blank(u))
            .or_else(|| store.get(&self.tab_id).map(|t| t.url.clone()))
            .unwrap_or_default()
    }

    fn on_favicon<S, V>(&mut self, store: &mut S, view: &V, favicons: &[serde_json::Value]) -> EventOutcome
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        if self.aux.awaiting_commit {
            debug!(tab = %self.tab_id, "favicon from superseded document ignored");
            return EventOutcome::Ignored;
        }
        let page = self.page_url(store, view);
        let favicon = first_reported(favicons)
            .and_then(|href| resolve_against(&page, &href))
            .map(Favicon::Source)
            .unwrap_or_default();
        self.aux.settle_favicon();
        store.update_field(&self.tab_id, TabPatch::favicon(favicon));
        EventOutcome::Applied
    }

    fn on_favicon_failed<S, V>(&mut self, store: &mut S, view: &V, src: String) -> EventOutcome
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        let showing = store
            .get(&self.tab_id)
            .is_some_and(|t| t.favicon.source() == Some(src.as_str()));
        if !showing {
            return EventOutcome::Ignored;
        }
        debug!(tab = %self.tab_id, %src, "favicon image failed");
        if !self.aux.failed_icons.contains(&src) {
            self.aux.failed_icons.push(src);
        }
        if self.aux.favicon_candidates.is_empty() {
            let page = self.page_url(store, view);
            self.aux.favicon_candidates = candidates(&page, &[]);
        }
        self.apply_next_candidate(store);
        EventOutcome::Applied
    }

    fn start_probe<S, V>(&mut self, store: &mut S, view: &mut V)
    where
        S: TabSessionStoreTrait,
        V: ContentView + ?Sized,
    {
        let page_url = self.page_url(store, view);
        self.next_ticket += 1;
        let ticket = ScriptTicket(self.next_ticket);
        match view.execute_script(FAVICON_PROBE_SCRIPT, ticket) {
            Ok(()) => {
                self.aux.probe = Some(PendingProbe {
                    ticket,
                    generation: self.aux.generation,
                    page_url,
                });
            }
            Err(err) => {
                debug!(tab = %self.tab_id, error = %err, "favicon probe unavailable");
                self.aux.favicon_pending = false;
                self.aux.favicon_candidates = candidates(&page_url, &[]);
                self.apply_next_candidate(store);
            }
        }
    }

    fn on_probe_result<S: TabSessionStoreTrait>(
        &mut self,
        store: &mut S,
        ticket: ScriptTicket,
        result: Result<serde_json::Value, String>,
    ) -> EventOutcome {
        let probe = match self.aux.probe.take() {
            Some(probe) if probe.ticket == ticket => probe,
            other => {
                self.aux.probe = other;
                return EventOutcome::Ignored;
            }
        };
        if probe.generation != self.aux.generation || !self.aux.favicon_pending || self.aux.awaiting_commit {
            debug!(tab = %self.tab_id, "stale favicon probe ignored");
            return EventOutcome::Ignored;
        }

        let declared = match result {
            Ok(value) => parse_probe_result(&value),
            Err(err) => {
                debug!(tab = %self.tab_id, error = %err, "favicon probe failed");
                Vec::new()
            }
        };
        self.aux.favicon_pending = false;
        self.aux.favicon_candidates = candidates(&probe.page_url, &declared);
        self.apply_next_candidate(store);
        EventOutcome::Applied
    }

    fn apply_next_candidate<S: TabSessionStoreTrait>(&mut self, store: &mut S) {
        while let Some(next) = self.aux.favicon_candidates.pop_front() {
            if self.aux.failed_icons.contains(&next) {
                continue;
            }
            store.update_field(&self.tab_id, TabPatch::favicon(Favicon::Source(next)));
            return;
        }
        store.update_field(&self.tab_id, TabPatch::favicon(Favicon::Default));
    }
}
