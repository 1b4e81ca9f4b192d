//! Integration-level tests for the SettingsEngine on an on-disk database.
//!
//! Theme color and mode are the only durable preferences; they must survive
//! a restart and fall back to defaults when the stored value is unusable.

use std::sync::Arc;

use tempfile::TempDir;

use suma::app::App;
use suma::config::AppConfig;
use suma::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use suma::database::Database;
use suma::navigation::content_view::HeadlessViewFactory;
use suma::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use suma::services::theme_engine::ThemeEngineTrait;
use suma::types::errors::SettingsError;
use suma::types::settings::{ThemeMode, ThemeSettings, DEFAULT_ACCENT, THEME_COLOR_KEY};

/// Opens (or reopens) the settings database inside `dir`.
fn engine_in(dir: &TempDir) -> SettingsEngine {
    let db = Database::open(dir.path().join("suma.db")).unwrap();
    SettingsEngine::new(Arc::new(db))
}

#[test]
fn test_fresh_database_has_defaults() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    assert_eq!(engine.load_theme().unwrap(), ThemeSettings::default());
}

#[test]
fn test_migrations_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = Database::open(dir.path().join("suma.db")).unwrap();
    drop(first);
    let second = Database::open(dir.path().join("suma.db")).unwrap();
    assert_eq!(get_schema_version(second.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_theme_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let engine = engine_in(&dir);
        engine.save_theme_color("#EF5C63").unwrap();
        engine.save_theme_mode(ThemeMode::Light).unwrap();
    }

    let engine = engine_in(&dir);
    assert_eq!(
        engine.load_theme().unwrap(),
        ThemeSettings {
            color: "#EF5C63".into(),
            mode: ThemeMode::Light,
        }
    );
}

#[test]
fn test_corrupt_color_falls_back() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine.set(THEME_COLOR_KEY, "#GGGGGG").unwrap();
    assert_eq!(engine.load_theme().unwrap().color, DEFAULT_ACCENT);
}

#[test]
fn test_invalid_color_is_not_stored() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    assert!(matches!(
        engine.save_theme_color("rgb(1,2,3)"),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(engine.get(THEME_COLOR_KEY).unwrap(), None);
}

#[test]
fn test_app_restores_theme_on_start() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    {
        let mut app = App::new(&config, HeadlessViewFactory::default()).unwrap();
        let palette = app.set_theme_color("#25C4D1").unwrap();
        assert_eq!(palette.accent, "#25C4D1");
        app.set_theme_mode(ThemeMode::Light).unwrap();
    }

    let app = App::new(&config, HeadlessViewFactory::default()).unwrap();
    assert_eq!(app.theme_engine.get_accent_color(), "#25C4D1");
    assert_eq!(app.theme_engine.get_theme(), ThemeMode::Light);
    assert_eq!(app.palette().mode, ThemeMode::Light);
}
