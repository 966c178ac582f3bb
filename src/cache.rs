//! Local JSON file cache for stations, sensors, and per-sensor measurements.
//!
//! Layout under the cache directory:
//!
//! ```text
//! stations.json            [ {id, name, latitude, longitude, city, ...}, ... ]
//! sensors.json             [ {id, stationId, paramName, ...}, ... ]
//! measurements_{id}.json   [ {sensorId, paramCode, date, value, valid}, ... ]
//! ```
//!
//! Each file is one entity collection and is always replaced whole. Writes go
//! to a temporary sibling first and are renamed into place, so a reader sees
//! either the old collection or the new one. Access to one file is serialised
//! by a lock keyed on the file name; different files do not contend.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CacheError;
use crate::model::{filter_by_date_range, Measurement, Sensor, Station};

const STATIONS_FILE: &str = "stations.json";
const SENSORS_FILE: &str = "sensors.json";
const MEASUREMENTS_FILE_PREFIX: &str = "measurements_";

pub struct CacheStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // --- Stations -----------------------------------------------------------

    pub fn save_stations(&self, stations: &[Station]) -> Result<(), CacheError> {
        self.write_collection(STATIONS_FILE, stations)
    }

    /// Every cached station; empty if nothing was ever cached.
    pub fn load_stations(&self) -> Result<Vec<Station>, CacheError> {
        self.read_collection(STATIONS_FILE)
    }

    // --- Sensors ------------------------------------------------------------

    pub fn save_sensors(&self, sensors: &[Sensor]) -> Result<(), CacheError> {
        self.write_collection(SENSORS_FILE, sensors)
    }

    pub fn load_sensors(&self) -> Result<Vec<Sensor>, CacheError> {
        self.read_collection(SENSORS_FILE)
    }

    pub fn load_sensors_for_station(&self, station_id: i64) -> Result<Vec<Sensor>, CacheError> {
        let mut sensors = self.load_sensors()?;
        sensors.retain(|s| s.station_id() == station_id);
        Ok(sensors)
    }

    /// Replaces the cached sensors of one station, leaving every other
    /// station's sensors in place. The read and the write happen under one
    /// lock.
    pub fn replace_station_sensors(
        &self,
        station_id: i64,
        sensors: &[Sensor],
    ) -> Result<(), CacheError> {
        let lock = self.lock_for(SENSORS_FILE);
        let _guard = acquire(&lock);

        let path = self.path_for(SENSORS_FILE);
        let mut merged: Vec<Sensor> = read_file(&path)?;
        merged.retain(|s| s.station_id() != station_id);
        merged.extend(sensors.iter().cloned());
        write_file(&self.dir, &path, &merged)
    }

    // --- Measurements -------------------------------------------------------

    pub fn save_measurements(
        &self,
        measurements: &[Measurement],
        sensor_id: i64,
    ) -> Result<(), CacheError> {
        self.write_collection(&measurements_file(sensor_id), measurements)
    }

    /// Cached readings of one sensor with `start <= date <= end`; a `None`
    /// bound is open.
    pub fn load_measurements(
        &self,
        sensor_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Measurement>, CacheError> {
        let all: Vec<Measurement> = self.read_collection(&measurements_file(sensor_id))?;
        if start.is_none() && end.is_none() {
            return Ok(all);
        }
        Ok(filter_by_date_range(&all, start, end))
    }

    // --- Plumbing -----------------------------------------------------------

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = acquire(&self.locks);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), CacheError> {
        let lock = self.lock_for(key);
        let _guard = acquire(&lock);
        write_file(&self.dir, &self.path_for(key), items)?;
        debug!(file = key, count = items.len(), "cache saved");
        Ok(())
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, CacheError> {
        let lock = self.lock_for(key);
        let _guard = acquire(&lock);
        let items: Vec<T> = read_file(&self.path_for(key))?;
        debug!(file = key, count = items.len(), "cache loaded");
        Ok(items)
    }
}

fn measurements_file(sensor_id: i64) -> String {
    format!("{}{}.json", MEASUREMENTS_FILE_PREFIX, sensor_id)
}

// The guarded data is `()` or a lock table, so a poisoned lock holds nothing
// inconsistent.
fn acquire<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_file<T: Serialize>(dir: &Path, path: &Path, items: &[T]) -> Result<(), CacheError> {
    fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

    let json = serde_json::to_vec_pretty(items)
        .map_err(|e| CacheError::malformed(path, format!("failed to serialize: {}", e)))?;

    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
    fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        CacheError::io(path, e)
    })
}

/// A missing file reads as an empty collection. Non-object entries are
/// skipped; an object that does not decode makes the whole file malformed.
fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CacheError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(path, e)),
    };

    let json: Value = serde_json::from_slice(&bytes)
        .map_err(|e| CacheError::malformed(path, format!("invalid JSON: {}", e)))?;
    let Value::Array(entries) = json else {
        return Err(CacheError::malformed(path, "expected a JSON array"));
    };

    entries
        .into_iter()
        .filter(Value::is_object)
        .map(|entry| {
            serde_json::from_value(entry)
                .map_err(|e| CacheError::malformed(path, format!("bad record: {}", e)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
