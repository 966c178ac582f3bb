//! Air-quality data client for the GIOŚ public monitoring API.
//!
//! Module map:
//!
//! ```text
//! model         Station, Sensor, Measurement, AnalysisResult, Trend
//! error         FetchError, CacheError, ConfigError
//! config        TOML + environment configuration
//! logging       tracing subscriber and failure classification
//! ingest        RemoteSource trait, GIOŚ client, cancellable requests
//! cache         JSON file cache, one file per collection
//! connectivity  TCP reachability probe
//! coordinator   online/offline fallback between ingest and cache
//! analysis      min / max / mean and trend of a series
//! ```

pub mod analysis;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
