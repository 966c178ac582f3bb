//! Remote data sources.
//!
//! Submodules:
//! - `gios`    : GIOŚ REST API: URL construction, blocking client, JSON parsing.
//! - `inflight`: runs a blocking fetch on a worker thread behind a
//!   cancellable, deadline-bounded handle.
//! - `fixtures` (test only): representative API response payloads.

pub mod gios;
pub mod inflight;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::FetchError;
use crate::model::{filter_by_city, Measurement, Sensor, Station};

/// A remote service that can list stations, their sensors, and sensor
/// readings.
///
/// Implementations do no caching; that is the coordinator's job.
pub trait RemoteSource: Send + Sync {
    fn fetch_stations(&self) -> Result<Vec<Station>, FetchError>;

    /// Stations whose city contains `city`, ignoring case.
    ///
    /// The service has no city filter, so this fetches every station and
    /// filters locally.
    fn fetch_stations_by_city(&self, city: &str) -> Result<Vec<Station>, FetchError> {
        Ok(filter_by_city(self.fetch_stations()?, city))
    }

    fn fetch_sensors(&self, station_id: i64) -> Result<Vec<Sensor>, FetchError>;

    fn fetch_measurements(&self, sensor_id: i64) -> Result<Vec<Measurement>, FetchError>;
}
