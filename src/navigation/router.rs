//! Routes content-view events to the tab that owns the view.
//!
//! A route exists exactly as long as its [`ViewBinding`] guard, so a tab that
//! is closed or rebound to another view stops receiving that view's events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::types::navigation::ViewId;
use crate::types::tab::TabId;

type RouteTable = Mutex<HashMap<ViewId, TabId>>;

#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    routes: Arc<RouteTable>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes events of `view` to `tab`, replacing any previous owner.
    pub fn bind(&self, view: ViewId, tab: TabId) -> ViewBinding {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = routes.insert(view, tab.clone()) {
            debug!(%view, from = %previous, to = %tab, "view route replaced");
        }
        ViewBinding {
            view,
            tab,
            routes: Arc::downgrade(&self.routes),
        }
    }

    pub fn route(&self, view: ViewId) -> Option<TabId> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&view)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped listener group for one (tab, view) pair. Dropping it removes the
/// route unless another binding has since claimed the view.
#[derive(Debug)]
pub struct ViewBinding {
    view: ViewId,
    tab: TabId,
    routes: Weak<RouteTable>,
}

impl ViewBinding {
    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn tab(&self) -> &TabId {
        &self.tab
    }
}

impl Drop for ViewBinding {
    fn drop(&mut self) {
        let Some(routes) = self.routes.upgrade() else {
            return;
        };
        let mut routes = routes.lock().unwrap_or_else(PoisonError::into_inner);
        if routes.get(&self.view) == Some(&self.tab) {
            routes.remove(&self.view);
            debug!(view = %self.view, tab = %self.tab, "view route removed");
        }
    }
}
