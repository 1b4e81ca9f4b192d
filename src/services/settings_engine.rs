// Suma Settings Engine
// Persists the two theme preferences in the SQLite key-value table.
// Unknown keys are rejected; malformed stored values fall back to defaults.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::database::migrations::unix_now;
use crate::database::Database;
use crate::services::theme_engine::normalize_accent;
use crate::types::errors::SettingsError;
use crate::types::settings::{ThemeMode, ThemeSettings, THEME_COLOR_KEY, THEME_MODE_KEY};

const KNOWN_KEYS: [&str; 2] = [THEME_COLOR_KEY, THEME_MODE_KEY];

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn load_theme(&self) -> Result<ThemeSettings, SettingsError>;
    /// Stores the accent color and returns the value actually stored.
    fn save_theme_color(&self, color: &str) -> Result<String, SettingsError>;
    fn save_theme_mode(&self, mode: ThemeMode) -> Result<(), SettingsError>;
    fn reset(&self) -> Result<(), SettingsError>;
}

pub struct SettingsEngine {
    db: Arc<Database>,
}

impl SettingsEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn check_key(key: &str) -> Result<(), SettingsError> {
        if KNOWN_KEYS.contains(&key) {
            Ok(())
        } else {
            Err(SettingsError::InvalidKey(key.to_string()))
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Self::check_key(key)?;
        let value = self
            .db
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        Self::check_key(key)?;
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, unix_now()],
        )?;
        debug!(key, value, "setting stored");
        Ok(())
    }

    fn load_theme(&self) -> Result<ThemeSettings, SettingsError> {
        let defaults = ThemeSettings::default();

        let color = match self.get(THEME_COLOR_KEY)? {
            Some(raw) => normalize_accent(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored accent ignored");
                defaults.color.clone()
            }),
            None => defaults.color.clone(),
        };
        let mode = match self.get(THEME_MODE_KEY)? {
            Some(raw) => raw.parse::<ThemeMode>().unwrap_or_else(|e| {
                warn!(error = %e, "stored theme mode ignored");
                defaults.mode
            }),
            None => defaults.mode,
        };

        Ok(ThemeSettings { color, mode })
    }

    fn save_theme_color(&self, color: &str) -> Result<String, SettingsError> {
        let color = normalize_accent(color).map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        self.set(THEME_COLOR_KEY, &color)?;
        Ok(color)
    }

    fn save_theme_mode(&self, mode: ThemeMode) -> Result<(), SettingsError> {
        self.set(THEME_MODE_KEY, mode.as_str())
    }

    fn reset(&self) -> Result<(), SettingsError> {
        self.db.connection().execute("DELETE FROM kv_store", [])?;
        Ok(())
    }
}
