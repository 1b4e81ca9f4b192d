// Suma platform abstraction
// Per-OS locations for the preferences database and config files,
// selected at compile time with `cfg(target_os)`.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory name used under the per-user base directories.
pub const APP_DIR_NAME: &str = "suma";

/// Platform configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/suma` or `~/.config/suma`
/// - **macOS**: `~/Library/Application Support/Suma`
/// - **Windows**: `%APPDATA%\Suma`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Platform data directory; holds `suma.db`.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
