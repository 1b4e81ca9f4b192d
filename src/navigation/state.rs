use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::types::navigation::ScriptTicket;

/// How long the retry notice stays visible.
pub const TOAST_TTL: Duration = Duration::from_secs(4);

/// Observable lifecycle phase of one tab's reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilerPhase {
    Blank,
    Validating,
    Loading,
    Loaded,
    Failed,
}

/// An outstanding DOM favicon probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProbe {
    pub ticket: ScriptTicket,
    pub generation: u64,
    pub page_url: String,
}

/// Per-tab bookkeeping that never reaches the session store.
#[derive(Debug, Default)]
pub struct TabAuxState {
    /// Bumped whenever a navigation starts or is superseded.
    pub generation: u64,
    /// The current document still needs a real favicon.
    pub favicon_pending: bool,
    /// A navigation to a different host started and has not committed yet.
    pub awaiting_commit: bool,
    pub last_host: Option<String>,
    /// Host that already got its `www.` retry.
    pub last_retry_host: Option<String>,
    pub probe: Option<PendingProbe>,
    pub favicon_candidates: VecDeque<String>,
    /// Icon sources the tab bar could not load for the current document.
    pub failed_icons: Vec<String>,
    /// The current target came from input that was neither a URL nor blank.
    pub ambiguous_target: bool,
    /// A load was requested and the view has not reported back yet.
    pub validating: bool,
    pub blank: bool,
}

impl TabAuxState {
    /// Invalidates every in-flight async result of the previous navigation.
    pub fn supersede(&mut self) {
        self.generation += 1;
        self.probe = None;
        self.favicon_candidates.clear();
        self.failed_icons.clear();
    }

    /// Stops favicon resolution for the current document.
    pub fn settle_favicon(&mut self) {
        self.favicon_pending = false;
        self.probe = None;
        self.favicon_candidates.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub deadline: Instant,
}

/// Holds at most one transient notice.
#[derive(Debug, Default)]
pub struct ToastSlot {
    current: Option<Toast>,
}

impl ToastSlot {
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some(Toast {
            message: message.into(),
            deadline: now + TOAST_TTL,
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Dismisses an expired toast. Returns true if one was dismissed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(toast) if now >= toast.deadline => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.message.as_str())
    }
}
