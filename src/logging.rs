//! Structured logging for the air-quality service.
//!
//! Installs a `tracing` subscriber and provides failure classification so
//! remote errors are logged at a level that reflects how surprising they
//! are: a dropped connection is routine for an offline-capable client, a
//! payload of the wrong shape is not.

use std::fmt;

use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use crate::error::FetchError;

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_level`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - no network, service down, slow link, user cancel
    Expected,
    /// Unexpected failure - the service answered with something we can't read
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        FetchError::Network(_) | FetchError::Timeout | FetchError::Cancelled => {
            FailureType::Expected
        }
        FetchError::Malformed(_) => FailureType::Unexpected,
    }
}

/// Logs a remote failure at a level matching its classification.
///
/// `target` is the station or sensor id the request was about, if any.
pub fn log_fetch_failure(operation: &str, target: Option<i64>, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    match failure_type {
        FailureType::Expected => warn!(
            operation,
            target,
            failure = %failure_type,
            error = %err,
            "remote fetch failed"
        ),
        FailureType::Unexpected => error!(
            operation,
            target,
            failure = %failure_type,
            error = %err,
            "remote fetch failed"
        ),
    }
    if matches!(err, FetchError::Cancelled) {
        debug!(operation, "request was cancelled by the caller");
    }
}
