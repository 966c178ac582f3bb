//! Online/offline fallback between the remote service and the local cache.
//!
//! Every request follows the same policy:
//!
//! 1. Offline: answer from the cache. An empty collection on disk means
//!    "no offline data"; a filter that matches nothing in a non-empty
//!    collection is just an empty result.
//! 2. Online: ask the remote. On success the full fetched collection is
//!    persisted (best effort) and returned.
//! 3. Any remote failure flips the coordinator offline for good and the
//!    request is retried from step 1.
//!
//! Going back online is never automatic; see [`Coordinator::reprobe`].
//!
//! Nothing here prints or prompts. Mode changes and persistence failures
//! are reported to the caller as [`Event`]s alongside the data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::connectivity::Probe;
use crate::error::{CacheError, FetchError};
use crate::ingest::inflight::InFlight;
use crate::ingest::RemoteSource;
use crate::logging::log_fetch_failure;
use crate::model::{filter_by_city, filter_by_date_range, Measurement, Sensor, Station};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Items { source: Source, items: Vec<T> },
    /// Offline, and the cache holds nothing for this kind of request.
    NoOfflineData,
}

impl<T> Outcome<T> {
    pub fn items(&self) -> Option<&[T]> {
        match self {
            Outcome::Items { items, .. } => Some(items),
            Outcome::NoOfflineData => None,
        }
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            Outcome::Items { source, .. } => Some(*source),
            Outcome::NoOfflineData => None,
        }
    }

    /// The items, or an empty vector for `NoOfflineData`.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Outcome::Items { items, .. } => items,
            Outcome::NoOfflineData => Vec::new(),
        }
    }
}

/// Something the caller may want to tell the user about.
#[derive(Debug)]
pub enum Event {
    /// This request's remote failure switched the coordinator offline.
    WentOffline(FetchError),
    /// Data was fetched but could not be written to the cache.
    PersistFailed(CacheError),
}

#[derive(Debug)]
pub struct Fetched<T> {
    pub outcome: Outcome<T>,
    pub events: Vec<Event>,
}

impl<T> Fetched<T> {
    pub fn went_offline(&self) -> bool {
        self.events.iter().any(|e| matches!(e, Event::WentOffline(_)))
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct Coordinator {
    remote: Arc<dyn RemoteSource>,
    cache: Arc<CacheStore>,
    offline: AtomicBool,
    deadline: Option<Duration>,
}

impl Coordinator {
    pub fn new(remote: Arc<dyn RemoteSource>, cache: Arc<CacheStore>, offline: bool) -> Self {
        Self {
            remote,
            cache,
            offline: AtomicBool::new(offline),
            deadline: None,
        }
    }

    /// Starts offline if `probe` cannot reach the service.
    pub fn with_probe(remote: Arc<dyn RemoteSource>, cache: Arc<CacheStore>, probe: &Probe) -> Self {
        let reachable = probe.is_reachable();
        info!(
            host = %probe.host,
            mode = if reachable { "online" } else { "offline" },
            "initial connectivity check"
        );
        Self::new(remote, cache, !reachable)
    }

    /// Runs each remote call on a worker thread and abandons it after
    /// `limit`. Without this the remote's own timeout is the only bound.
    pub fn with_deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    pub fn set_offline(&self, offline: bool) {
        let was = self.offline.swap(offline, Ordering::AcqRel);
        if was != offline {
            info!(offline, "mode set explicitly");
        }
    }

    /// Checks connectivity again and sets the mode from the answer. Returns
    /// true if the coordinator is now online.
    pub fn reprobe(&self, probe: &Probe) -> bool {
        let reachable = probe.is_reachable();
        self.set_offline(!reachable);
        reachable
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // --- Requests -----------------------------------------------------------

    pub fn stations(&self) -> Result<Fetched<Station>, CacheError> {
        self.serve(
            "fetch_stations",
            None,
            |remote| remote.fetch_stations(),
            |cache, items| cache.save_stations(items),
            |cache| cache.load_stations(),
            |items| items,
        )
    }

    /// Stations whose city contains `city`, ignoring case. The whole station
    /// list is fetched (and cached) and filtered afterwards.
    pub fn stations_by_city(&self, city: &str) -> Result<Fetched<Station>, CacheError> {
        self.serve(
            "fetch_stations_by_city",
            None,
            |remote| remote.fetch_stations(),
            |cache, items| cache.save_stations(items),
            |cache| cache.load_stations(),
            |items| filter_by_city(items, city),
        )
    }

    pub fn sensors(&self, station_id: i64) -> Result<Fetched<Sensor>, CacheError> {
        self.serve(
            "fetch_sensors",
            Some(station_id),
            move |remote| remote.fetch_sensors(station_id),
            |cache, items| cache.replace_station_sensors(station_id, items),
            |cache| cache.load_sensors(),
            |mut items| {
                items.retain(|s| s.station_id() == station_id);
                items
            },
        )
    }

    /// Readings of one sensor with `start <= date <= end`. The full series
    /// is cached before the range is applied.
    pub fn measurements(
        &self,
        sensor_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Fetched<Measurement>, CacheError> {
        self.serve(
            "fetch_measurements",
            Some(sensor_id),
            move |remote| remote.fetch_measurements(sensor_id),
            |cache, items| cache.save_measurements(items, sensor_id),
            |cache| cache.load_measurements(sensor_id, None, None),
            |items| match (start, end) {
                (None, None) => items,
                _ => filter_by_date_range(&items, start, end),
            },
        )
    }

    /// Persists a series the caller already holds.
    pub fn save_measurements(
        &self,
        measurements: &[Measurement],
        sensor_id: i64,
    ) -> Result<(), CacheError> {
        self.cache.save_measurements(measurements, sensor_id)
    }

    // --- Policy -------------------------------------------------------------

    fn serve<T, F, P, L, S>(
        &self,
        operation: &'static str,
        target: Option<i64>,
        fetch: F,
        persist: P,
        load_all: L,
        select: S,
    ) -> Result<Fetched<T>, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RemoteSource) -> Result<Vec<T>, FetchError> + Send + 'static,
        P: FnOnce(&CacheStore, &[T]) -> Result<(), CacheError>,
        L: FnOnce(&CacheStore) -> Result<Vec<T>, CacheError>,
        S: FnOnce(Vec<T>) -> Vec<T>,
    {
        let mut events = Vec::new();

        if !self.is_offline() {
            match self.call_remote(fetch) {
                Ok(items) => {
                    if let Err(e) = persist(self.cache.as_ref(), items.as_slice()) {
                        warn!(operation, target, error = %e, "failed to cache fetched data");
                        events.push(Event::PersistFailed(e));
                    }
                    return Ok(Fetched {
                        outcome: Outcome::Items {
                            source: Source::Remote,
                            items: select(items),
                        },
                        events,
                    });
                }
                Err(err) => {
                    log_fetch_failure(operation, target, &err);
                    if !self.offline.swap(true, Ordering::AcqRel) {
                        warn!(operation, "switching to offline mode");
                        events.push(Event::WentOffline(err));
                    }
                }
            }
        }

        let all = load_all(self.cache.as_ref())?;
        if all.is_empty() {
            info!(operation, target, "offline and nothing cached");
            return Ok(Fetched {
                outcome: Outcome::NoOfflineData,
                events,
            });
        }

        let items = select(all);
        debug!(operation, target, count = items.len(), "served from cache");
        Ok(Fetched {
            outcome: Outcome::Items {
                source: Source::Cache,
                items,
            },
            events,
        })
    }

    fn call_remote<T, F>(&self, fetch: F) -> Result<T, FetchError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RemoteSource) -> Result<T, FetchError> + Send + 'static,
    {
        match self.deadline {
            None => fetch(self.remote.as_ref()),
            Some(limit) => {
                let remote = Arc::clone(&self.remote);
                InFlight::spawn(limit, move || fetch(remote.as_ref())).wait()?
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
