// Suma platform paths for Windows.
// Config and data share %APPDATA%\Suma.

use std::env;
use std::path::PathBuf;

fn roaming_dir() -> PathBuf {
    let base = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(base).join("Suma")
}

pub fn get_config_dir() -> PathBuf {
    roaming_dir()
}

pub fn get_data_dir() -> PathBuf {
    roaming_dir()
}
