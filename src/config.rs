use log::LevelFilter;
use std::env;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

const API_BASE_VAR: &str = "YTMUSIC_API_BASE";
const LOG_VAR: &str = "YTMUSIC_CLIENT_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Data API root, without a trailing slash.
    pub api_base: String,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_base: DEFAULT_API_BASE.to_string(),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_vars(env::var(API_BASE_VAR).ok(), env::var(LOG_VAR).ok())
    }

    fn from_vars(api_base: Option<String>, log_level: Option<String>) -> Config {
        let mut c = Config::default();
        if let Some(base) = api_base.filter(|s| !s.trim().is_empty()) {
            c.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(level) = log_level.and_then(|s| s.trim().parse().ok()) {
            c.log_level = level;
        }
        c
    }

    pub fn with_api_base(mut self, api_base: &str) -> Config {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}
