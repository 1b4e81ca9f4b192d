use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title shown for blank tabs and before a page reports its own title.
pub const NEW_TAB_TITLE: &str = "New Tab";

/// Opaque, immutable tab identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TabId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Icon shown for a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum Favicon {
    /// The bundled default logo.
    #[default]
    Default,
    /// An absolute URL or a `data:` URI.
    Source(String),
}

impl Favicon {
    pub fn source(&self) -> Option<&str> {
        match self {
            Favicon::Default => None,
            Favicon::Source(src) => Some(src),
        }
    }
}

/// One navigable session as seen by the tab bar and address bar.
///
/// Records are immutable snapshots: the session store replaces a record on
/// every observable change and keeps it untouched otherwise, so callers can
/// detect changes with `Arc::ptr_eq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    /// Empty for a blank tab.
    pub url: String,
    pub title: String,
    pub favicon: Favicon,
    pub loading: bool,
}

impl Tab {
    pub fn is_blank(&self) -> bool {
        self.url.is_empty()
    }
}

/// Partial update for a tab record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabPatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub favicon: Option<Favicon>,
    pub loading: Option<bool>,
}

impl TabPatch {
    pub fn url(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Self::default() }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Self::default() }
    }

    pub fn favicon(favicon: Favicon) -> Self {
        Self { favicon: Some(favicon), ..Self::default() }
    }

    pub fn loading(loading: bool) -> Self {
        Self { loading: Some(loading), ..Self::default() }
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn with_favicon(mut self, favicon: Favicon) -> Self {
        self.favicon = Some(favicon);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.title.is_none() && self.favicon.is_none() && self.loading.is_none()
    }
}
