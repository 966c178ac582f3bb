/// Live checks against the public GIOŚ API.
///
/// These tests make real HTTP calls and are ignored by default.
///
/// Run with: cargo test --test gios_live -- --ignored --test-threads=1
///
/// Note: they may fail if the service is down, rate-limiting, or has
/// changed its payloads; a failure here is worth a look at the parsers.

use std::time::Duration;

use airmon_service::ingest::gios::{GiosClient, DEFAULT_BASE_URL};
use airmon_service::ingest::RemoteSource;

fn client() -> GiosClient {
    GiosClient::new(DEFAULT_BASE_URL, Duration::from_secs(20)).expect("client builds")
}

#[test]
#[ignore]
fn test_live_station_list_parses() {
    let stations = client().fetch_stations().expect("station list");
    assert!(stations.len() > 100, "expected a national network, got {}", stations.len());
    assert!(
        stations.iter().all(|s| s.id() > 0 && !s.name().is_empty()),
        "every station needs an id and a name"
    );
}

#[test]
#[ignore]
fn test_live_station_sensors_and_readings() {
    let gios = client();
    let station = gios
        .fetch_stations_by_city("Warszawa")
        .expect("stations")
        .into_iter()
        .next()
        .expect("at least one station in Warsaw");

    let sensors = gios.fetch_sensors(station.id()).expect("sensors");
    assert!(!sensors.is_empty(), "station {} has no sensors", station.id());
    assert!(sensors.iter().all(|s| s.station_id() == station.id()));

    let readings = gios.fetch_measurements(sensors[0].id()).expect("readings");
    assert!(readings.iter().all(|m| m.sensor_id() == sensors[0].id()));
}
