//! Service configuration.
//!
//! Values come from three layers, later ones winning:
//!   1. built-in defaults,
//!   2. an optional TOML file (`airmon.toml` unless told otherwise),
//!   3. `AIRMON_*` environment variables, after `.env` has been loaded.
//!
//! A missing file is not an error; an unreadable or invalid one is.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::ingest::gios::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

pub const DEFAULT_CONFIG_FILE: &str = "airmon.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GIOŚ REST API, without a trailing operation path.
    pub base_url: String,
    /// Per-request bound for remote fetches.
    pub timeout_ms: u64,
    /// Directory holding the JSON cache files.
    pub cache_dir: PathBuf,
    /// Host and port the startup connectivity probe connects to.
    pub probe_host: String,
    pub probe_port: u16,
    pub probe_timeout_ms: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            cache_dir: PathBuf::from("data"),
            probe_host: "api.gios.gov.pl".to_string(),
            probe_port: 80,
            probe_timeout_ms: 3_000,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads `airmon.toml` from the working directory (if present) and
    /// applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let path = env::var("AIRMON_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a TOML file. Keys it omits keep their defaults; a file that does
    /// not exist yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overrides fields from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AIRMON_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("AIRMON_TIMEOUT_MS") {
            self.timeout_ms = parse_env("AIRMON_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("AIRMON_CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("AIRMON_PROBE_HOST") {
            self.probe_host = v;
        }
        if let Some(v) = lookup("AIRMON_PROBE_PORT") {
            self.probe_port = parse_env("AIRMON_PROBE_PORT", v)?;
        }
        if let Some(v) = lookup("AIRMON_PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = parse_env("AIRMON_PROBE_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("AIRMON_LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
