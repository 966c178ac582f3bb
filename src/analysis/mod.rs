//! Summary statistics and trend classification over a measurement series.
//!
//! Submodules:
//! - `summary`: min / max / mean and the `analyze` entry point.
//! - `trend`  : least-squares slope plus the fluctuation override.

pub mod summary;
pub mod trend;

pub use summary::analyze;
pub use trend::classify_trend;
