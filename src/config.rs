//! Process configuration from the environment and command line.
//!
//! Precedence for the first tab's URL: `--start-url`, then a `startUrl`
//! query argument, then `SUMA_START_URL`.

use std::path::PathBuf;

use clap::Parser;
use url::form_urlencoded;

use crate::platform;
use crate::services::assistant::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

pub const DATA_DIR_ENV: &str = "SUMA_DATA_DIR";
pub const START_URL_ENV: &str = "SUMA_START_URL";
pub const ASSISTANT_ENDPOINT_ENV: &str = "SUMA_ASSISTANT_ENDPOINT";
pub const ASSISTANT_MODEL_ENV: &str = "SUMA_ASSISTANT_MODEL";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const LOG_ENV: &str = "SUMA_LOG";

const DB_FILE: &str = "suma.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub start_url: Option<String>,
    pub assistant_endpoint: String,
    pub assistant_model: String,
    pub assistant_api_key: Option<String>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: platform::get_data_dir(),
            start_url: None,
            assistant_endpoint: DEFAULT_ENDPOINT.to_string(),
            assistant_model: DEFAULT_MODEL.to_string(),
            assistant_api_key: None,
            log_filter: "info".to_string(),
        }
    }
}

/// Command-line flags shared by both binaries.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "suma", version, about = "A tabbed desktop browser shell")]
pub struct Cli {
    /// URL or search text for the first tab.
    #[arg(long, value_name = "URL")]
    pub start_url: Option<String>,

    /// Directory holding the preferences database.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Launch arguments; the first carrying a `startUrl` query seeds the
    /// first tab.
    #[arg(value_name = "LAUNCH_URL")]
    pub launch: Vec<String>,
}

impl AppConfig {
    /// Reads the real process environment and arguments. Exits with usage on
    /// bad flags.
    pub fn from_env() -> Self {
        Self::from_cli(Cli::parse(), |key| std::env::var(key).ok())
    }

    /// Parses `args` (without the program name) and merges them with `env`.
    pub fn from_sources<I, F>(args: I, env: F) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let cli = Cli::try_parse_from(std::iter::once("suma".to_string()).chain(args))?;
        Ok(Self::from_cli(cli, env))
    }

    /// Flags win over the environment, which wins over defaults.
    pub fn from_cli<F>(cli: Cli, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = cli.data_dir.or_else(|| env(DATA_DIR_ENV).map(PathBuf::from)) {
            config.data_dir = dir;
        }
        if let Some(endpoint) = env(ASSISTANT_ENDPOINT_ENV) {
            config.assistant_endpoint = endpoint;
        }
        if let Some(model) = env(ASSISTANT_MODEL_ENV) {
            config.assistant_model = model;
        }
        if let Some(filter) = env(LOG_ENV) {
            config.log_filter = filter;
        }
        config.assistant_api_key = env(API_KEY_ENV);

        let query_start = cli.launch.iter().find_map(|arg| start_url_from_query(arg));
        config.start_url = cli
            .start_url
            .or(query_start)
            .or_else(|| env(START_URL_ENV))
            .filter(|u| !u.trim().is_empty());
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

/// Extracts `startUrl` from a query string or a URL carrying one.
pub fn start_url_from_query(input: &str) -> Option<String> {
    let query = match input.split_once('?') {
        Some((_, query)) => query,
        None if input.contains("startUrl=") => input,
        None => return None,
    };
    let query = query.split('#').next().unwrap_or_default();
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "startUrl")
        .map(|(_, value)| value.into_owned())
}
