//! Theme Engine: resolves the theme mode and accent color into a palette.
//!
//! [`palette`] is pure; [`ThemeEngine`] only remembers the current choice and
//! hands the resulting palette to a [`PaletteSink`] in one call.

use serde::Serialize;
use tracing::debug;

use crate::types::errors::ThemeError;
use crate::types::settings::{ThemeMode, DEFAULT_ACCENT};

/// Title bar overlay height in logical pixels.
pub const TITLE_BAR_HEIGHT: u32 = 35;

/// Alpha of the soft accent used for hover and selection backgrounds.
const ACCENT_SOFT_ALPHA: f32 = 0.6;

/// Trait defining the theme engine interface.
pub trait ThemeEngineTrait {
    fn set_theme(&mut self, mode: ThemeMode);
    fn get_theme(&self) -> ThemeMode;
    fn set_accent_color(&mut self, color: &str) -> Result<(), ThemeError>;
    fn get_accent_color(&self) -> &str;
    fn detect_system_theme(&self) -> ThemeMode;
    fn palette(&self) -> Palette;
    fn apply_palette(&self, sink: &mut dyn PaletteSink);
}

/// Receives a freshly computed palette (window chrome, webview CSS, RPC client).
pub trait PaletteSink {
    fn apply_palette(&mut self, palette: &Palette);
}

/// Native window controls overlay colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleBarOverlay {
    pub color: String,
    pub symbol_color: String,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    /// Concrete mode; never `System`.
    pub mode: ThemeMode,
    pub background: String,
    pub surface: String,
    pub surface_hover: String,
    pub text: String,
    pub text_muted: String,
    pub border: String,
    pub accent: String,
    pub accent_soft: String,
    pub title_bar: TitleBarOverlay,
}

impl Palette {
    /// CSS custom properties in a stable order.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--bg", self.background.clone()),
            ("--surface", self.surface.clone()),
            ("--surface-hover", self.surface_hover.clone()),
            ("--text", self.text.clone()),
            ("--text-muted", self.text_muted.clone()),
            ("--border", self.border.clone()),
            ("--accent", self.accent.clone()),
            ("--accent-soft", self.accent_soft.clone()),
            ("--titlebar-height", format!("{}px", self.title_bar.height)),
        ]
    }

    /// A `:root` rule declaring every variable.
    pub fn to_css(&self) -> String {
        let body: String = self
            .css_variables()
            .iter()
            .map(|(name, value)| format!("  {}: {};\n", name, value))
            .collect();
        format!(":root {{\n  color-scheme: {};\n{}}}\n", self.mode, body)
    }
}

/// Validates a hex color string (e.g. "#57b6ef" or "#fff").
fn is_valid_hex_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates a swatch or user color. `transparent` maps to black.
pub fn normalize_accent(color: &str) -> Result<String, ThemeError> {
    let trimmed = color.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Ok("#000000".to_string());
    }
    if !is_valid_hex_color(trimmed) {
        return Err(ThemeError::InvalidColor(color.to_string()));
    }
    Ok(trimmed.to_string())
}

fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// `rgba(...)` form of a hex color.
pub fn rgba(color: &str, alpha: f32) -> Option<String> {
    let (r, g, b) = hex_to_rgb(color)?;
    Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
}

struct BaseColors {
    background: &'static str,
    surface: &'static str,
    surface_hover: &'static str,
    text: &'static str,
    text_muted: &'static str,
    border: &'static str,
    symbol: &'static str,
}

const DARK: BaseColors = BaseColors {
    background: "#000000",
    surface: "#151517",
    surface_hover: "#222226",
    text: "#f2f2f3",
    text_muted: "#9d9da6",
    border: "#2b2b30",
    symbol: "#ffffff",
};

const LIGHT: BaseColors = BaseColors {
    background: "#ffffff",
    surface: "#f3f3f5",
    surface_hover: "#e6e6ea",
    text: "#17171a",
    text_muted: "#5b5b66",
    border: "#d5d5dc",
    symbol: "#000000",
};

/// Maps a mode and accent to the full palette. `System` is treated as dark;
/// callers that can detect the platform preference resolve it first.
/// An invalid accent falls back to the default.
pub fn palette(mode: ThemeMode, accent: &str) -> Palette {
    let accent = normalize_accent(accent).unwrap_or_else(|_| DEFAULT_ACCENT.to_string());
    let (mode, base) = match mode {
        ThemeMode::Light => (ThemeMode::Light, &LIGHT),
        ThemeMode::Dark | ThemeMode::System => (ThemeMode::Dark, &DARK),
    };
    let accent_soft = rgba(&accent, ACCENT_SOFT_ALPHA).unwrap_or_else(|| accent.clone());
    Palette {
        mode,
        background: base.background.to_string(),
        surface: base.surface.to_string(),
        surface_hover: base.surface_hover.to_string(),
        text: base.text.to_string(),
        text_muted: base.text_muted.to_string(),
        border: base.border.to_string(),
        accent,
        accent_soft,
        title_bar: TitleBarOverlay {
            color: base.background.to_string(),
            symbol_color: base.symbol.to_string(),
            height: TITLE_BAR_HEIGHT,
        },
    }
}

/// The theme engine implementation.
pub struct ThemeEngine {
    current_theme: ThemeMode,
    accent_color: String,
}

impl ThemeEngine {
    pub fn new(mode: ThemeMode, accent: &str) -> Self {
        Self {
            current_theme: mode,
            accent_color: normalize_accent(accent).unwrap_or_else(|_| DEFAULT_ACCENT.to_string()),
        }
    }

    fn effective_theme(&self) -> ThemeMode {
        match self.current_theme {
            ThemeMode::System => self.detect_system_theme(),
            other => other,
        }
    }
}

impl Default for ThemeEngine {
    fn default() -> Self {
        Self::new(ThemeMode::default(), DEFAULT_ACCENT)
    }
}

impl ThemeEngineTrait for ThemeEngine {
    fn set_theme(&mut self, mode: ThemeMode) {
        self.current_theme = mode;
    }

    fn get_theme(&self) -> ThemeMode {
        self.current_theme
    }

    fn set_accent_color(&mut self, color: &str) -> Result<(), ThemeError> {
        self.accent_color = normalize_accent(color)?;
        Ok(())
    }

    fn get_accent_color(&self) -> &str {
        &self.accent_color
    }

    fn detect_system_theme(&self) -> ThemeMode {
        // Without a toolkit query, GTK_THEME is the only hint available.
        match std::env::var("GTK_THEME") {
            Ok(theme) if !theme.to_lowercase().contains("dark") => ThemeMode::Light,
            _ => ThemeMode::Dark,
        }
    }

    fn palette(&self) -> Palette {
        palette(self.effective_theme(), &self.accent_color)
    }

    fn apply_palette(&self, sink: &mut dyn PaletteSink) {
        let palette = self.palette();
        debug!(mode = %palette.mode, accent = %palette.accent, "applying palette");
        sink.apply_palette(&palette);
    }
}
