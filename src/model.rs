//! Core data types for the air-quality monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! stations, the sensors mounted on them, the readings those sensors report,
//! and the summary produced by `analysis`. It holds no I/O.
//!
//! The serde layout of `Station`, `Sensor` and `Measurement` is the on-disk
//! cache record layout. The remote wire layout lives in `ingest::gios`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A fixed physical monitoring location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    commune: String,
    #[serde(default)]
    district: String,
    #[serde(default)]
    province: String,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        city: impl Into<String>,
        address: impl Into<String>,
        commune: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            city: city.into(),
            address: address.into(),
            commune: commune.into(),
            district: district.into(),
            province: province.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn commune(&self) -> &str {
        &self.commune
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn province(&self) -> &str {
        &self.province
    }
}

/// Case-insensitive substring match of `needle` against the station's city.
///
/// An empty needle matches every station.
pub fn matches_city(station: &Station, needle: &str) -> bool {
    station
        .city
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Keeps the stations whose city contains `needle`, ignoring case.
pub fn filter_by_city(stations: Vec<Station>, needle: &str) -> Vec<Station> {
    stations
        .into_iter()
        .filter(|s| matches_city(s, needle))
        .collect()
}

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// One measured parameter (e.g. PM10) at a station.
///
/// `station_id` is not checked against any known station; orphaned sensors
/// are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    id: i64,
    station_id: i64,
    #[serde(default)]
    param_name: String,
    #[serde(default)]
    param_formula: String,
    #[serde(default)]
    param_code: String,
    #[serde(rename = "idParam", default)]
    param_id: i64,
}

impl Sensor {
    pub fn new(
        id: i64,
        station_id: i64,
        param_name: impl Into<String>,
        param_formula: impl Into<String>,
        param_code: impl Into<String>,
        param_id: i64,
    ) -> Self {
        Self {
            id,
            station_id,
            param_name: param_name.into(),
            param_formula: param_formula.into(),
            param_code: param_code.into(),
            param_id,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn station_id(&self) -> i64 {
        self.station_id
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    pub fn param_formula(&self) -> &str {
        &self.param_formula
    }

    pub fn param_code(&self) -> &str {
        &self.param_code
    }

    pub fn param_id(&self) -> i64 {
        self.param_id
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// One timestamped reading from a sensor.
///
/// A reading the service reported as `null` is kept with `valid == false`.
/// Its stored value is `0.0`, which is not a real reading; use
/// [`Measurement::reading`] to get the value only when it means something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMeasurement")]
pub struct Measurement {
    sensor_id: i64,
    param_code: String,
    date: DateTime<Utc>,
    value: f64,
    valid: bool,
}

impl Measurement {
    /// A valid reading.
    pub fn new(
        sensor_id: i64,
        param_code: impl Into<String>,
        date: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self {
            sensor_id,
            param_code: param_code.into(),
            date,
            value,
            valid: true,
        }
    }

    /// A slot the service reported without a value.
    pub fn invalid(sensor_id: i64, param_code: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            sensor_id,
            param_code: param_code.into(),
            date,
            value: 0.0,
            valid: false,
        }
    }

    pub fn sensor_id(&self) -> i64 {
        self.sensor_id
    }

    pub fn param_code(&self) -> &str {
        &self.param_code
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// The stored numeric value, meaningless when `is_valid()` is false.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The value if this is a valid reading.
    pub fn reading(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

/// Cache record as read back from disk. Older files may carry a `null`
/// value or omit `valid`; both are normalised here.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMeasurement {
    sensor_id: i64,
    #[serde(default)]
    param_code: String,
    date: DateTime<Utc>,
    value: Option<f64>,
    #[serde(default = "default_valid")]
    valid: bool,
}

fn default_valid() -> bool {
    true
}

impl From<StoredMeasurement> for Measurement {
    fn from(stored: StoredMeasurement) -> Self {
        match stored.value {
            Some(value) if stored.valid => {
                Measurement::new(stored.sensor_id, stored.param_code, stored.date, value)
            }
            _ => Measurement::invalid(stored.sensor_id, stored.param_code, stored.date),
        }
    }
}

/// Keeps the measurements with `start <= date <= end`. A `None` bound is
/// open on that side. Input order is preserved.
pub fn filter_by_date_range(
    measurements: &[Measurement],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Measurement> {
    measurements
        .iter()
        .filter(|m| start.is_none_or(|s| m.date >= s))
        .filter(|m| end.is_none_or(|e| m.date <= e))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Qualitative direction of a measurement series over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Fluctuating,
    #[default]
    Unknown,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::Fluctuating => "fluctuating",
            Trend::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary statistics over the valid readings of a series.
///
/// The default value (all zeros, no dates, `Trend::Unknown`) is what an
/// empty or all-invalid series produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisResult {
    pub min_value: f64,
    pub min_date: Option<DateTime<Utc>>,
    pub max_value: f64,
    pub max_date: Option<DateTime<Utc>>,
    pub avg_value: f64,
    pub trend: Trend,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
