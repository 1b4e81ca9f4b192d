//! App Core for Suma.
//!
//! Composition root: owns the session store, the control bus, the popup
//! bridge, one (view, reconciler) slot per tab, and the theme preferences.
//! Hosts feed it view events and intents and read back what to render.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::database::connection::Database;
use crate::host::HostBridge;
use crate::managers::popup_bridge::{PopupBridge, PopupOrigin, WindowRequest};
use crate::managers::tab_bar::{ClickTarget, IntentEffect, TabBarIntent, TabChip, TabStrip};
use crate::managers::tab_manager::{TabSessionStore, TabSessionStoreTrait};
use crate::navigation::bus::NavigationBus;
use crate::navigation::content_view::{ContentView, HeadlessViewFactory, ViewCommand, ViewFactory};
use crate::navigation::reconciler::{EventOutcome, NavigationReconciler, ReconcilerStatus};
use crate::navigation::router::EventRouter;
use crate::services::assistant::{AssistantPanel, RemoteAssistant};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::theme_engine::{Palette, PaletteSink, ThemeEngine, ThemeEngineTrait};
use crate::types::assistant::AssistantReply;
use crate::types::errors::SettingsError;
use crate::types::navigation::{ContentEvent, IntentOrigin, NavCommand, NavigationIntent, ViewId};
use crate::types::settings::ThemeMode;
use crate::types::tab::TabId;

/// A tab's content view together with the reconciler driving it.
pub struct TabSlot<V> {
    pub view: V,
    pub reconciler: NavigationReconciler,
}

pub struct App<F: ViewFactory> {
    pub db: Arc<Database>,
    pub store: TabSessionStore,
    pub bus: NavigationBus,
    pub router: EventRouter,
    pub popups: PopupBridge,
    pub settings_engine: SettingsEngine,
    pub theme_engine: ThemeEngine,
    pub assistant: AssistantPanel,
    assistant_backend: RemoteAssistant,
    factory: F,
    slots: HashMap<TabId, TabSlot<F::View>>,
    pending_windows: Vec<WindowRequest>,
    theme_dirty: bool,
}

impl<F: ViewFactory> App<F> {
    /// Opens the preferences database under `config.data_dir` and seeds the
    /// first tab.
    pub fn new(config: &AppConfig, factory: F) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = Arc::new(Database::open(config.db_path())?);
        Ok(Self::with_database(db, config, factory))
    }

    /// Same as [`App::new`] with a throwaway in-memory database.
    pub fn in_memory(config: &AppConfig, factory: F) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self::with_database(db, config, factory))
    }

    pub fn with_database(db: Arc<Database>, config: &AppConfig, factory: F) -> Self {
        let settings_engine = SettingsEngine::new(db.clone());
        let theme = settings_engine.load_theme().unwrap_or_else(|e| {
            warn!(error = %e, "theme preferences unavailable, using defaults");
            Default::default()
        });
        let theme_engine = ThemeEngine::new(theme.mode, &theme.color);
        let assistant_backend = RemoteAssistant::new(
            config.assistant_endpoint.clone(),
            config.assistant_model.clone(),
            config.assistant_api_key.clone(),
        );

        let mut app = Self {
            db,
            store: TabSessionStore::new(config.start_url.as_deref()),
            bus: NavigationBus::new(),
            router: EventRouter::new(),
            popups: PopupBridge::new(),
            settings_engine,
            theme_engine,
            assistant: AssistantPanel::new(),
            assistant_backend,
            factory,
            slots: HashMap::new(),
            pending_windows: Vec::new(),
            theme_dirty: true,
        };
        let first = app.store.active_id().clone();
        app.attach(&first, IntentOrigin::ProgrammaticRedirect);
        app.sync_active();
        info!(tab = %first, start_url = ?config.start_url, "app started");
        app
    }

    /// Creates the view and reconciler for `tab_id` and starts loading its
    /// stored url, if any.
    fn attach(&mut self, tab_id: &TabId, origin: IntentOrigin) {
        if self.slots.contains_key(tab_id) {
            return;
        }
        let mut view = self.factory.create_view(tab_id);
        let mut reconciler =
            NavigationReconciler::new(tab_id.clone(), self.bus.subscribe(), self.popups.sender());
        reconciler.bind(&self.router, view.id());

        let url = self.store.get(tab_id).map(|t| t.url.clone()).unwrap_or_default();
        if !url.is_empty() {
            reconciler.navigate(
                &mut self.store,
                &mut view,
                NavigationIntent::new(url, origin),
            );
        }
        debug!(tab = %tab_id, view = %view.id(), "tab attached");
        self.slots.insert(tab_id.clone(), TabSlot { view, reconciler });
    }

    fn sync_active(&mut self) {
        let active = self.store.active_id().clone();
        for (id, slot) in self.slots.iter_mut() {
            slot.reconciler.set_active(*id == active);
        }
    }

    // ---- tabs ----

    /// Opens a new active tab, optionally navigating it.
    pub fn create_tab(&mut self, url: Option<&str>) -> TabId {
        let id = self.store.create_tab(url);
        self.store.activate_tab(&id);
        self.attach(&id, IntentOrigin::UserTyped);
        self.sync_active();
        id
    }

    pub fn apply_tab_intent(&mut self, intent: TabBarIntent) -> IntentEffect {
        let effect = TabStrip::apply_intent(&mut self.store, intent);
        match &effect {
            IntentEffect::Created(id) => self.attach(id, IntentOrigin::UserTyped),
            IntentEffect::Closed(id) => {
                if self.slots.remove(id).is_some() {
                    info!(tab = %id, "tab closed");
                }
            }
            IntentEffect::Activated(_) | IntentEffect::Unchanged => {}
        }
        self.sync_active();
        effect
    }

    pub fn click_tab(&mut self, id: &TabId, target: ClickTarget) -> IntentEffect {
        self.apply_tab_intent(TabStrip::intent_for_click(id, target))
    }

    pub fn close_tab(&mut self, id: &TabId) -> bool {
        matches!(self.apply_tab_intent(TabBarIntent::Close(id.clone())), IntentEffect::Closed(_))
    }

    pub fn activate_tab(&mut self, id: &TabId) -> bool {
        matches!(
            self.apply_tab_intent(TabBarIntent::Activate(id.clone())),
            IntentEffect::Activated(_)
        )
    }

    pub fn tab_strip(&self) -> Vec<TabChip> {
        TabStrip::project(&self.store, self.theme_engine.get_accent_color())
    }

    pub fn slot(&self, id: &TabId) -> Option<&TabSlot<F::View>> {
        self.slots.get(id)
    }

    /// Every attached view with whether its tab is the active one.
    pub fn views(&self) -> impl Iterator<Item = (&F::View, bool)> + '_ {
        self.slots.values().map(|slot| (&slot.view, slot.reconciler.is_active()))
    }

    /// Reconciler status for every tab, in tab order.
    pub fn statuses(&self) -> Vec<ReconcilerStatus> {
        self.store
            .snapshot()
            .iter()
            .filter_map(|tab| self.slots.get(&tab.id))
            .map(|slot| slot.reconciler.status(&self.store))
            .collect()
    }

    // ---- navigation ----

    /// Address-bar submit on the active tab.
    pub fn submit_address(&mut self, input: &str) {
        let id = self.store.active_id().clone();
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.reconciler
                .navigate(&mut self.store, &mut slot.view, NavigationIntent::typed(input));
        }
    }

    /// Broadcasts `command` and lets every reconciler drain it.
    pub fn publish(&mut self, command: NavCommand) {
        self.bus.publish(command);
        self.pump();
    }

    pub fn pump(&mut self) {
        for slot in self.slots.values_mut() {
            slot.reconciler.pump_commands(&mut self.store, &mut slot.view);
        }
        self.drain_popups();
    }

    /// Routes a view event to the owning tab's reconciler.
    pub fn dispatch_view_event(&mut self, view_id: ViewId, event: ContentEvent) -> EventOutcome {
        let Some(tab_id) = self.router.route(view_id) else {
            debug!(view = %view_id, event = event.name(), "event for unknown view dropped");
            return EventOutcome::Ignored;
        };
        let Some(slot) = self.slots.get_mut(&tab_id) else {
            return EventOutcome::Ignored;
        };
        slot.view.observe(&event);
        let outcome = slot.reconciler.handle_event(&mut self.store, &mut slot.view, event);
        self.drain_popups();
        outcome
    }

    /// Host-originated new-tab request (e.g. a native menu or a relayed
    /// `window.open`).
    pub fn open_popup(&mut self, url: &str, origin: PopupOrigin) {
        self.popups.sender().request(url, origin, None);
        self.drain_popups();
    }

    fn drain_popups(&mut self) {
        let outcome = self.popups.drain(&mut self.store);
        if outcome.is_empty() {
            return;
        }
        for (id, _) in &outcome.opened {
            self.attach(id, IntentOrigin::Popup);
        }
        self.pending_windows.extend(outcome.windows);
        self.sync_active();
    }

    /// Expires toasts.
    pub fn tick(&mut self, now: Instant) {
        for slot in self.slots.values_mut() {
            slot.reconciler.tick(now);
        }
    }

    // ---- theme ----

    pub fn palette(&self) -> Palette {
        self.theme_engine.palette()
    }

    pub fn set_theme_color(&mut self, color: &str) -> Result<Palette, SettingsError> {
        let stored = self.settings_engine.save_theme_color(color)?;
        self.theme_engine
            .set_accent_color(&stored)
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        self.theme_dirty = true;
        Ok(self.palette())
    }

    pub fn set_theme_mode(&mut self, mode: ThemeMode) -> Result<Palette, SettingsError> {
        self.settings_engine.save_theme_mode(mode)?;
        self.theme_engine.set_theme(mode);
        self.theme_dirty = true;
        Ok(self.palette())
    }

    /// Delivers queued window requests and, after a theme change, the new
    /// chrome colors and palette.
    pub fn flush_host<H: HostBridge + PaletteSink>(&mut self, host: &mut H) {
        for window in self.pending_windows.drain(..) {
            host.open_popup_window(&window.url);
        }
        if self.theme_dirty {
            let palette = self.palette();
            host.set_theme_mode(self.theme_engine.get_theme(), &palette.title_bar);
            self.theme_engine.apply_palette(host);
            self.theme_dirty = false;
        }
    }

    // ---- assistant ----

    /// Runs one assistant turn to completion on a private runtime.
    pub fn run_assistant(&mut self, text: &str) -> Option<AssistantReply> {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(error = %err, "assistant runtime unavailable");
                return None;
            }
        };
        runtime.block_on(self.assistant.submit(&self.assistant_backend, text))
    }

    /// Drops every view and listener.
    pub fn shutdown(&mut self) {
        self.slots.clear();
        info!("app shut down");
    }
}

impl App<HeadlessViewFactory> {
    /// Commands the headless views recorded since the last call.
    pub fn take_view_commands(&mut self) -> Vec<(ViewId, ViewCommand)> {
        let mut out = Vec::new();
        for slot in self.slots.values_mut() {
            let id = slot.view.id();
            out.extend(slot.view.take_commands().into_iter().map(|c| (id, c)));
        }
        out.sort_by_key(|(id, _)| *id);
        out
    }
}
