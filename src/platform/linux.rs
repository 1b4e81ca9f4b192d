// Suma platform paths for Linux (XDG base directories).

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

fn xdg_or_home(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(base) if !base.is_empty() => PathBuf::from(base).join(APP_DIR_NAME),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            fallback
                .iter()
                .fold(PathBuf::from(home), |p, seg| p.join(seg))
                .join(APP_DIR_NAME)
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_or_home("XDG_CONFIG_HOME", &[".config"])
}

pub fn get_data_dir() -> PathBuf {
    xdg_or_home("XDG_DATA_HOME", &[".local", "share"])
}
