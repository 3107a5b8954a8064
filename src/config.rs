//! Process configuration, read once at startup from the environment (and `.env`).

use crate::consts::{endpoints, limits, DEFAULT_TARGET_LANG};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name}: invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub google_url: String,
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    /// Fail the translation when the page lacks a token instead of sending an empty one
    pub strict_tokens: bool,
    pub default_target_lang: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_url: endpoints::DEFAULT_BASE_URL.to_string(),
            database_path: PathBuf::from("words.db"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            request_timeout_secs: limits::REQUEST_TIMEOUT_SECS,
            strict_tokens: false,
            default_target_lang: DEFAULT_TARGET_LANG.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("GOOGLE_URL").filter(|v| !v.trim().is_empty()) {
            config.google_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", addr)?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse("REQUEST_TIMEOUT_SECS", secs)?;
        }
        if let Some(flag) = lookup("STRICT_TOKENS") {
            config.strict_tokens = parse_flag("STRICT_TOKENS", flag)?;
        }
        if let Some(lang) = lookup("DEFAULT_TARGET_LANG") {
            config.default_target_lang = lang;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
