//! GIOŚ (Główny Inspektorat Ochrony Środowiska) air-quality REST API client.
//!
//! Handles URL construction, the blocking HTTP client, and JSON parsing for
//! the three endpoints the service consumes:
//!
//!   GET {base}/station/findAll           → array of stations
//!   GET {base}/station/sensors/{station} → array of sensors
//!   GET {base}/data/getData/{sensor}     → {key, values:[{date, value}]}
//!
//! Parsing is kept in free functions so it can be tested against the
//! payloads in `fixtures.rs` without a network.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::ingest::RemoteSource;
use crate::model::{Measurement, Sensor, Station};

pub const DEFAULT_BASE_URL: &str = "https://api.gios.gov.pl/pjp-api/rest";

/// Fixed per-request bound.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const STATIONS_ENDPOINT: &str = "/station/findAll";
const SENSORS_ENDPOINT: &str = "/station/sensors";
const MEASUREMENTS_ENDPOINT: &str = "/data/getData";

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

pub fn stations_url(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), STATIONS_ENDPOINT)
}

pub fn sensors_url(base: &str, station_id: i64) -> String {
    format!("{}{}/{}", base.trim_end_matches('/'), SENSORS_ENDPOINT, station_id)
}

pub fn measurements_url(base: &str, sensor_id: i64) -> String {
    format!("{}{}/{}", base.trim_end_matches('/'), MEASUREMENTS_ENDPOINT, sensor_id)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GiosClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl GiosClient {
    /// Every request made through this client is aborted once `timeout`
    /// elapses, including the time spent reading the body.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = %url, "requesting");

        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(FetchError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        response.text().map_err(FetchError::from_reqwest)
    }
}

impl RemoteSource for GiosClient {
    fn fetch_stations(&self) -> Result<Vec<Station>, FetchError> {
        let body = self.get_text(&stations_url(&self.base_url))?;
        parse_stations(&body)
    }

    fn fetch_sensors(&self, station_id: i64) -> Result<Vec<Sensor>, FetchError> {
        let body = self.get_text(&sensors_url(&self.base_url, station_id))?;
        parse_sensors(&body)
    }

    fn fetch_measurements(&self, sensor_id: i64) -> Result<Vec<Measurement>, FetchError> {
        let body = self.get_text(&measurements_url(&self.base_url, sensor_id))?;
        parse_measurements(&body, sensor_id)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a `station/findAll` body.
///
/// Entries that are not objects are skipped; missing fields fall back to
/// empty strings / zero, matching how sparse the service's records are.
///
/// # Errors
/// - `FetchError::Malformed`: not JSON, or not a JSON array.
pub fn parse_stations(body: &str) -> Result<Vec<Station>, FetchError> {
    let json = parse_json(body)?;
    let entries = json
        .as_array()
        .ok_or_else(|| FetchError::Malformed("expected JSON array for stations".into()))?;

    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let city = obj.get("city").and_then(Value::as_object);
            let commune = city
                .and_then(|c| c.get("commune"))
                .and_then(Value::as_object);

            Station::new(
                int_field(obj, "id"),
                str_field(Some(obj), "stationName"),
                float_field(obj, "gegrLat"),
                float_field(obj, "gegrLon"),
                str_field(city, "name"),
                str_field(Some(obj), "addressStreet"),
                str_field(commune, "communeName"),
                str_field(commune, "districtName"),
                str_field(commune, "provinceName"),
            )
        })
        .collect())
}

/// Parses a `station/sensors/{id}` body.
///
/// # Errors
/// - `FetchError::Malformed`: not JSON, or not a JSON array.
pub fn parse_sensors(body: &str) -> Result<Vec<Sensor>, FetchError> {
    let json = parse_json(body)?;
    let entries = json
        .as_array()
        .ok_or_else(|| FetchError::Malformed("expected JSON array for sensors".into()))?;

    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let param = obj.get("param").and_then(Value::as_object);
            Sensor::new(
                int_field(obj, "id"),
                int_field(obj, "stationId"),
                str_field(param, "paramName"),
                str_field(param, "paramFormula"),
                str_field(param, "paramCode"),
                param.map(|p| int_field(p, "idParam")).unwrap_or_default(),
            )
        })
        .collect())
}

/// Parses a `data/getData/{id}` body into measurements for `sensor_id`.
///
/// The payload does not name its sensor, so the id is taken from the
/// request. A `null` value yields an invalid measurement; entries whose date
/// cannot be read are dropped.
///
/// # Errors
/// - `FetchError::Malformed`: not JSON, or not a JSON object.
pub fn parse_measurements(body: &str, sensor_id: i64) -> Result<Vec<Measurement>, FetchError> {
    let json = parse_json(body)?;
    let obj = json
        .as_object()
        .ok_or_else(|| FetchError::Malformed("expected JSON object for measurements".into()))?;

    let key = str_field(Some(obj), "key");
    let values = obj
        .get("values")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut measurements = Vec::with_capacity(values.len());
    for entry in values.iter().filter_map(Value::as_object) {
        let raw_date = entry.get("date").and_then(Value::as_str).unwrap_or_default();
        let Some(date) = parse_service_date(raw_date) else {
            debug!(sensor_id, date = raw_date, "skipping entry with unreadable date");
            continue;
        };

        match entry.get("value").and_then(Value::as_f64) {
            Some(value) => measurements.push(Measurement::new(sensor_id, key.clone(), date, value)),
            None => measurements.push(Measurement::invalid(sensor_id, key.clone(), date)),
        }
    }

    Ok(measurements)
}

/// Reads the service's timestamps: RFC 3339, or naive local-less
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC).
pub fn parse_service_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_json(body: &str) -> Result<Value, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Malformed(format!("invalid JSON: {}", e)))
}

fn str_field(obj: Option<&Map<String, Value>>, key: &str) -> String {
    obj.and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(obj: &Map<String, Value>, key: &str) -> i64 {
    obj.get(key).and_then(Value::as_i64).unwrap_or_default()
}

// Coordinates come back as strings from findAll.
fn float_field(obj: &Map<String, Value>, key: &str) -> f64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use chrono::TimeZone;

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_urls_append_operation_paths_to_base() {
        assert_eq!(
            stations_url(DEFAULT_BASE_URL),
            "https://api.gios.gov.pl/pjp-api/rest/station/findAll"
        );
        assert_eq!(
            sensors_url(DEFAULT_BASE_URL, 14),
            "https://api.gios.gov.pl/pjp-api/rest/station/sensors/14"
        );
        assert_eq!(
            measurements_url(DEFAULT_BASE_URL, 92),
            "https://api.gios.gov.pl/pjp-api/rest/data/getData/92"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_is_not_doubled() {
        let url = stations_url("http://localhost:8080/rest/");
        assert_eq!(url, "http://localhost:8080/rest/station/findAll");
    }

    // --- Stations -----------------------------------------------------------

    #[test]
    fn test_parse_stations_flattens_city_and_commune() {
        let stations = parse_stations(fixture_stations_json()).expect("fixture should parse");
        assert_eq!(stations.len(), 3);

        let bartnicza = &stations[0];
        assert_eq!(bartnicza.id(), 114);
        assert_eq!(bartnicza.name(), "Wrocław - Bartnicza");
        assert_eq!(bartnicza.city(), "Wrocław");
        assert_eq!(bartnicza.address(), "ul. Bartnicza");
        assert_eq!(bartnicza.commune(), "Wrocław");
        assert_eq!(bartnicza.district(), "Wrocław");
        assert_eq!(bartnicza.province(), "DOLNOŚLĄSKIE");
    }

    #[test]
    fn test_parse_stations_accepts_string_and_numeric_coordinates() {
        let stations = parse_stations(fixture_stations_json()).expect("fixture should parse");
        assert!((stations[0].latitude() - 51.115933).abs() < 1e-9, "string latitude");
        assert!((stations[1].longitude() - 17.02925).abs() < 1e-9, "numeric longitude");
    }

    #[test]
    fn test_parse_stations_null_address_becomes_empty() {
        let stations = parse_stations(fixture_stations_json()).expect("fixture should parse");
        assert_eq!(stations[2].address(), "");
    }

    #[test]
    fn test_parse_stations_rejects_object_body() {
        let result = parse_stations(r#"{"error":"maintenance"}"#);
        assert!(
            matches!(result, Err(FetchError::Malformed(_))),
            "object body should be Malformed, got {:?}",
            result
        );
    }

    #[test]
    fn test_parse_stations_rejects_non_json() {
        let result = parse_stations("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_stations_skips_non_object_entries() {
        let stations = parse_stations(r#"[1, "x", {"id": 5, "stationName": "A"}]"#)
            .expect("array should parse");
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id(), 5);
    }

    // --- Sensors ------------------------------------------------------------

    #[test]
    fn test_parse_sensors_reads_nested_param() {
        let sensors = parse_sensors(fixture_sensors_json()).expect("fixture should parse");
        assert_eq!(sensors.len(), 2);
        let pm10 = &sensors[0];
        assert_eq!(pm10.id(), 92);
        assert_eq!(pm10.station_id(), 14);
        assert_eq!(pm10.param_name(), "pył zawieszony PM10");
        assert_eq!(pm10.param_formula(), "PM10");
        assert_eq!(pm10.param_code(), "PM10");
        assert_eq!(pm10.param_id(), 3);
    }

    #[test]
    fn test_parse_sensors_rejects_object_body() {
        assert!(matches!(
            parse_sensors(r#"{"id": 1}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    // --- Measurements -------------------------------------------------------

    #[test]
    fn test_parse_measurements_takes_sensor_id_from_request() {
        let ms = parse_measurements(fixture_measurements_json(), 92).expect("fixture should parse");
        assert_eq!(ms.len(), 3);
        assert!(ms.iter().all(|m| m.sensor_id() == 92));
        assert!(ms.iter().all(|m| m.param_code() == "PM10"));
    }

    #[test]
    fn test_parse_measurements_null_value_is_invalid_zero() {
        let ms = parse_measurements(fixture_measurements_json(), 92).expect("fixture should parse");
        let newest = &ms[0];
        assert!(!newest.is_valid(), "null value must be flagged invalid");
        assert_eq!(newest.value(), 0.0);
        assert_eq!(
            newest.date(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );

        assert_eq!(ms[1].reading(), Some(31.4512));
        assert_eq!(ms[2].reading(), Some(27.1));
    }

    #[test]
    fn test_parse_measurements_rejects_array_body() {
        assert!(matches!(
            parse_measurements("[]", 1),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_measurements_without_values_is_empty() {
        let ms = parse_measurements(r#"{"key": "SO2"}"#, 1).expect("object should parse");
        assert!(ms.is_empty());
    }

    #[test]
    fn test_parse_measurements_drops_unreadable_dates() {
        let body = r#"{"key":"O3","values":[{"date":"yesterday","value":1.0},{"date":"2024-03-01T10:00:00Z","value":2.0}]}"#;
        let ms = parse_measurements(body, 3).expect("object should parse");
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].reading(), Some(2.0));
    }

    #[test]
    fn test_service_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_service_date("2024-03-01 10:00:00"), Some(expected));
        assert_eq!(parse_service_date("2024-03-01T10:00:00"), Some(expected));
        assert_eq!(parse_service_date("2024-03-01T11:00:00+01:00"), Some(expected));
        assert_eq!(parse_service_date(""), None);
    }

    // --- Transport ----------------------------------------------------------

    #[test]
    fn test_unreachable_host_is_network_error() {
        // Port 9 on localhost (discard) is closed on any sane test machine.
        let client = GiosClient::new("http://127.0.0.1:9", Duration::from_millis(2_000))
            .expect("client should build");
        let result = client.fetch_stations();
        assert!(
            matches!(result, Err(FetchError::Network(_)) | Err(FetchError::Timeout)),
            "closed port should fail at transport level, got {:?}",
            result
        );
    }
}
