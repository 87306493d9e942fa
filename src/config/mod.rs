//! Configuration module for the Books API.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret required on write routes (gate disabled when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file; books stay in memory when unset
    pub db_path: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit log lines as JSON
    pub log_json: bool,
    /// Seed sample books into an empty store at startup
    pub seed_demo: bool,
}

/// A variable was set to something that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {:?}", self.var, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("BOOKS_API_KEY").filter(|k| !k.is_empty());

        let db_path = lookup("BOOKS_DB_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let raw_addr = lookup("BOOKS_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError {
            var: "BOOKS_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let log_level = lookup("BOOKS_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = flag(&lookup, "BOOKS_LOG_JSON")?;
        let seed_demo = flag(&lookup, "BOOKS_SEED_DEMO")?;

        Ok(Self {
            api_key,
            db_path,
            bind_addr,
            log_level,
            log_json,
            seed_demo,
        })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<bool, ConfigError> {
    match lookup(var) {
        None => Ok(false),
        Some(value) => parse_flag(&value).ok_or(ConfigError { var, value }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
