//! Calls from the shell core out to the embedding host process.

use serde_json::{json, Value};

use crate::services::theme_engine::{Palette, PaletteSink, TitleBarOverlay};
use crate::types::settings::ThemeMode;

/// Host-process capabilities the core relies on.
pub trait HostBridge {
    /// Opens a new top-level window hosting a single tab at `url`.
    fn open_popup_window(&mut self, url: &str);
    /// Updates native window chrome for `mode`.
    fn set_theme_mode(&mut self, mode: ThemeMode, overlay: &TitleBarOverlay);
}

/// Host that turns every call into a JSON notification, for hosts on the
/// other side of a pipe.
#[derive(Debug, Default)]
pub struct NotificationHost {
    pending: Vec<Value>,
}

impl NotificationHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, event: &str, data: Value) {
        self.pending.push(json!({ "event": event, "data": data }));
    }

    pub fn take(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.pending)
    }
}

impl HostBridge for NotificationHost {
    fn open_popup_window(&mut self, url: &str) {
        self.notify("window.open", json!({ "url": url }));
    }

    fn set_theme_mode(&mut self, mode: ThemeMode, overlay: &TitleBarOverlay) {
        self.notify("theme.mode", json!({ "mode": mode, "overlay": overlay }));
    }
}

impl PaletteSink for NotificationHost {
    fn apply_palette(&mut self, palette: &Palette) {
        self.notify("theme.palette", json!({ "palette": palette, "css": palette.to_css() }));
    }
}
