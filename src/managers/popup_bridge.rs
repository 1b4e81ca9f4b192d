//! Popup/new-window bridge.
//!
//! Reconcilers, the host and guest `window.open` calls all push
//! [`PopupRequest`]s through a cloned [`PopupSender`]. The owner loop drains
//! them into new tabs, or into top-level window requests for the host.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::managers::tab_manager::TabSessionStoreTrait;
use crate::services::url_normalizer::{is_blank, sanitize_for_storage};
use crate::types::navigation::ViewId;
use crate::types::tab::TabId;

/// A content view can report one new-window intent twice (as its
/// `new-window` event and again as a relayed `window.open`). Requests from the
/// same view for the same url closer together than this collapse into one.
pub const DEDUP_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupOrigin {
    /// Open as a tab in the window that raised the request.
    SameWindow,
    /// Open in a new top-level window.
    CrossWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRequest {
    pub url: String,
    pub origin: PopupOrigin,
    /// View that raised the request; `None` for host-originated requests.
    pub source: Option<ViewId>,
    pub at: Instant,
}

/// A top-level window the host should open with a single tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRequest {
    pub url: String,
}

#[derive(Debug, Default)]
pub struct PopupOutcome {
    /// Tabs created and activated in this window, with their target url.
    pub opened: Vec<(TabId, String)>,
    pub windows: Vec<WindowRequest>,
}

impl PopupOutcome {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.windows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PopupSender {
    tx: mpsc::UnboundedSender<PopupRequest>,
}

impl PopupSender {
    pub fn request(&self, url: impl Into<String>, origin: PopupOrigin, source: Option<ViewId>) {
        let request = PopupRequest {
            url: url.into(),
            origin,
            source,
            at: Instant::now(),
        };
        if self.tx.send(request).is_err() {
            warn!("popup bridge closed, request dropped");
        }
    }
}

pub struct PopupBridge {
    tx: mpsc::UnboundedSender<PopupRequest>,
    rx: mpsc::UnboundedReceiver<PopupRequest>,
    recent: VecDeque<(String, Option<ViewId>, Instant)>,
}

impl PopupBridge {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            recent: VecDeque::new(),
        }
    }

    pub fn sender(&self) -> PopupSender {
        PopupSender { tx: self.tx.clone() }
    }

    /// Only view-raised requests are collapsed; every host request opens a
    /// tab.
    fn is_duplicate(&mut self, request: &PopupRequest) -> bool {
        if request.source.is_none() {
            return false;
        }
        self.recent
            .retain(|(_, _, at)| request.at.saturating_duration_since(*at) < DEDUP_WINDOW);
        let seen = self
            .recent
            .iter()
            .any(|(url, source, _)| *url == request.url && *source == request.source);
        if !seen {
            self.recent
                .push_back((request.url.clone(), request.source, request.at));
        }
        seen
    }

    /// Applies every queued request. Same-window requests each create and
    /// activate exactly one tab; cross-window requests are returned for the
    /// host.
    pub fn drain<S: TabSessionStoreTrait>(&mut self, store: &mut S) -> PopupOutcome {
        let mut outcome = PopupOutcome::default();
        while let Ok(request) = self.rx.try_recv() {
            let url = request.url.trim();
            if url.to_ascii_lowercase().starts_with("javascript:") {
                warn!(url, "script popup refused");
                continue;
            }
            if self.is_duplicate(&request) {
                debug!(url = %request.url, "duplicate popup request collapsed");
                continue;
            }

            let target = if is_blank(url) {
                String::new()
            } else {
                sanitize_for_storage(url)
            };
            match request.origin {
                PopupOrigin::SameWindow => {
                    let id = store.create_tab(Some(&target));
                    store.activate_tab(&id);
                    info!(tab = %id, url = %target, "popup opened as tab");
                    outcome.opened.push((id, target));
                }
                PopupOrigin::CrossWindow => {
                    info!(url = %target, "popup routed to new window");
                    outcome.windows.push(WindowRequest { url: target });
                }
            }
        }
        outcome
    }
}

impl Default for PopupBridge {
    fn default() -> Self {
        Self::new()
    }
}
