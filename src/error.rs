//! Error types for the data access layer.
//!
//! `FetchError` covers everything the remote service can do wrong and is
//! recovered by the coordinator (it switches to offline mode and retries
//! against the cache). `CacheError` has no further fallback and reaches the
//! caller unchanged.

use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the remote measurement service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, TLS failure, non-2xx status, ...
    #[error("Network error: {0}")]
    Network(String),
    /// The request did not complete within the configured bound.
    #[error("Request timed out")]
    Timeout,
    /// The body was not JSON, or was JSON of the wrong shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// The caller abandoned the request through its `InFlight` handle.
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failures reading or writing the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed cache file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CacheError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failures loading `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}
