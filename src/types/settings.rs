use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage key for the accent color.
pub const THEME_COLOR_KEY: &str = "theme.color";
/// Storage key for the theme mode.
pub const THEME_MODE_KEY: &str = "theme.mode";

/// Accent color used until the user picks one.
pub const DEFAULT_ACCENT: &str = "#57B6EF";

/// Swatches offered by the customize dialog. `transparent` maps to black.
pub const ACCENT_SWATCHES: [&str; 12] = [
    "#C8CFD2", "#25C4D1", "#D97A55", "#F8B8CE", "#EF5C63", "#F8A541", "#F4C136", "#E7D671",
    "#B7BF64", "#57B6EF", "#C59CDB", "transparent",
];

/// Theme mode selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
            ThemeMode::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            "system" => Ok(ThemeMode::System),
            other => Err(format!("unknown theme mode: {}", other)),
        }
    }
}

/// The only durable user preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeSettings {
    pub color: String,
    pub mode: ThemeMode,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            color: DEFAULT_ACCENT.to_string(),
            mode: ThemeMode::default(),
        }
    }
}
