use std::sync::Arc;

use tracing::debug;

use crate::services::url_normalizer::{display_host, is_blank, normalize, sanitize_for_storage};
use crate::types::tab::{Favicon, Tab, TabId, TabPatch, NEW_TAB_TITLE};

/// Trait defining the tab session interface.
///
/// Every operation is total: an id that does not exist is a silent no-op.
/// Mutating operations return whether observable state changed.
pub trait TabSessionStoreTrait {
    fn create_tab(&mut self, initial_url: Option<&str>) -> TabId;
    fn close_tab(&mut self, tab_id: &TabId) -> bool;
    fn activate_tab(&mut self, tab_id: &TabId) -> bool;
    fn update_field(&mut self, tab_id: &TabId, patch: TabPatch) -> bool;
    fn get(&self, tab_id: &TabId) -> Option<Arc<Tab>>;
    fn get_active(&self) -> Arc<Tab>;
    fn active_id(&self) -> &TabId;
    fn snapshot(&self) -> Arc<Vec<Arc<Tab>>>;
    fn len(&self) -> usize;
    fn index_of(&self, tab_id: &TabId) -> Option<usize>;
}

/// In-memory, ordered tab collection with an active-tab pointer.
///
/// The collection is never empty. Records and the collection itself are
/// shared `Arc`s replaced on write, so an update that changes nothing keeps
/// both pointers identical.
pub struct TabSessionStore {
    tabs: Arc<Vec<Arc<Tab>>>,
    active_tab_id: TabId,
    revision: u64,
}

impl TabSessionStore {
    /// Creates a store holding one tab seeded with `start_url`, active.
    pub fn new(start_url: Option<&str>) -> Self {
        let first = Self::build_tab(start_url);
        let active_tab_id = first.id.clone();
        Self {
            tabs: Arc::new(vec![Arc::new(first)]),
            active_tab_id,
            revision: 0,
        }
    }

    /// Monotonic counter bumped on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn build_tab(initial_url: Option<&str>) -> Tab {
        let raw = initial_url.unwrap_or("");
        let url = if is_blank(raw) {
            String::new()
        } else {
            sanitize_for_storage(&normalize(raw))
        };
        let title = if url.is_empty() {
            NEW_TAB_TITLE.to_string()
        } else {
            display_host(&url).unwrap_or_else(|| NEW_TAB_TITLE.to_string())
        };
        Tab {
            id: TabId::new(),
            url,
            title,
            favicon: Favicon::Default,
            loading: false,
        }
    }

    /// Applies `patch` to `tab`, returning the new record only if it differs.
    fn merge(tab: &Tab, patch: TabPatch) -> Option<Tab> {
        let mut next = tab.clone();

        if let Some(url) = patch.url {
            let url = sanitize_for_storage(&url);
            if url.is_empty() {
                next.url = String::new();
                next.title = NEW_TAB_TITLE.to_string();
                next.favicon = Favicon::Default;
                next.loading = false;
                // A blank tab ignores the rest of the patch.
                return (next != *tab).then_some(next);
            }
            next.url = url;
        }
        if let Some(title) = patch.title {
            let title = title.trim();
            if !title.is_empty() && !is_blank(title) {
                next.title = title.to_string();
            }
        }
        if let Some(favicon) = patch.favicon {
            next.favicon = favicon;
        }
        if let Some(loading) = patch.loading {
            next.loading = loading;
        }

        (next != *tab).then_some(next)
    }
}

impl TabSessionStoreTrait for TabSessionStore {
    /// Appends a new tab and returns its id. Does not activate it.
    fn create_tab(&mut self, initial_url: Option<&str>) -> TabId {
        let tab = Self::build_tab(initial_url);
        let id = tab.id.clone();
        debug!(tab = %id, url = %tab.url, "tab created");
        Arc::make_mut(&mut self.tabs).push(Arc::new(tab));
        self.revision += 1;
        id
    }

    /// Close a tab. If it's the active tab, switch to the clamped neighbor.
    /// The last remaining tab cannot be closed.
    fn close_tab(&mut self, tab_id: &TabId) -> bool {
        let Some(index) = self.index_of(tab_id) else {
            return false;
        };
        if self.tabs.len() == 1 {
            return false;
        }

        Arc::make_mut(&mut self.tabs).remove(index);
        if self.active_tab_id == *tab_id {
            let next = index.min(self.tabs.len() - 1);
            self.active_tab_id = self.tabs[next].id.clone();
        }
        self.revision += 1;
        debug!(tab = %tab_id, active = %self.active_tab_id, "tab closed");
        true
    }

    fn activate_tab(&mut self, tab_id: &TabId) -> bool {
        if self.active_tab_id == *tab_id || self.index_of(tab_id).is_none() {
            return false;
        }
        self.active_tab_id = tab_id.clone();
        self.revision += 1;
        true
    }

    fn update_field(&mut self, tab_id: &TabId, patch: TabPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(index) = self.index_of(tab_id) else {
            return false;
        };
        let Some(next) = Self::merge(&self.tabs[index], patch) else {
            return false;
        };
        Arc::make_mut(&mut self.tabs)[index] = Arc::new(next);
        self.revision += 1;
        true
    }

    fn get(&self, tab_id: &TabId) -> Option<Arc<Tab>> {
        self.tabs.iter().find(|t| t.id == *tab_id).cloned()
    }

    fn get_active(&self) -> Arc<Tab> {
        // The active id always references an existing record.
        self.get(&self.active_tab_id)
            .unwrap_or_else(|| Arc::clone(&self.tabs[0]))
    }

    fn active_id(&self) -> &TabId {
        &self.active_tab_id
    }

    fn snapshot(&self) -> Arc<Vec<Arc<Tab>>> {
        Arc::clone(&self.tabs)
    }

    fn len(&self) -> usize {
        self.tabs.len()
    }

    fn index_of(&self, tab_id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == *tab_id)
    }
}

impl Default for TabSessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}
