//! Tab bar presentation: a read-only projection of the session store plus
//! the three intents the strip can raise.

use serde::Serialize;

use crate::managers::tab_manager::TabSessionStoreTrait;
use crate::services::url_normalizer::display_host;
use crate::types::tab::{Favicon, Tab, TabId};

/// What a tab chip shows as its icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabIcon {
    Image { src: String },
    /// Letter badge used instead of a broken or unusable image.
    Glyph { letter: char, color: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabChip {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub icon: TabIcon,
    pub loading: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabBarIntent {
    Activate(TabId),
    Close(TabId),
    NewTab,
}

/// Which part of a chip was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Body,
    CloseButton,
}

/// Store change caused by an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentEffect {
    Activated(TabId),
    Closed(TabId),
    Created(TabId),
    Unchanged,
}

/// First letter of the host without `www.`, uppercased; `?` when unknown.
pub fn fallback_letter(url: &str) -> char {
    display_host(url)
        .and_then(|h| h.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?')
}

fn icon_for(tab: &Tab, accent: &str) -> TabIcon {
    match &tab.favicon {
        Favicon::Source(src) if !src.starts_with("data:image/svg") => TabIcon::Image { src: src.clone() },
        _ => TabIcon::Glyph {
            letter: fallback_letter(&tab.url),
            color: accent.to_string(),
        },
    }
}

pub struct TabStrip;

impl TabStrip {
    /// One chip per tab, in store order.
    pub fn project<S: TabSessionStoreTrait>(store: &S, accent: &str) -> Vec<TabChip> {
        let active = store.active_id();
        store
            .snapshot()
            .iter()
            .map(|tab| TabChip {
                id: tab.id.clone(),
                title: tab.title.clone(),
                url: tab.url.clone(),
                icon: icon_for(tab, accent),
                loading: tab.loading,
                active: tab.id == *active,
            })
            .collect()
    }

    /// Exactly one intent per click, so a close click never also activates.
    pub fn intent_for_click(id: &TabId, target: ClickTarget) -> TabBarIntent {
        match target {
            ClickTarget::Body => TabBarIntent::Activate(id.clone()),
            ClickTarget::CloseButton => TabBarIntent::Close(id.clone()),
        }
    }

    pub fn apply_intent<S: TabSessionStoreTrait>(store: &mut S, intent: TabBarIntent) -> IntentEffect {
        match intent {
            TabBarIntent::Activate(id) => {
                if store.activate_tab(&id) {
                    IntentEffect::Activated(id)
                } else {
                    IntentEffect::Unchanged
                }
            }
            TabBarIntent::Close(id) => {
                if store.close_tab(&id) {
                    IntentEffect::Closed(id)
                } else {
                    IntentEffect::Unchanged
                }
            }
            TabBarIntent::NewTab => {
                let id = store.create_tab(None);
                store.activate_tab(&id);
                IntentEffect::Created(id)
            }
        }
    }
}
